//! Custom assertion helpers for domain invariants

use domain_invoicing::Invoice;
use rust_decimal::Decimal;

/// Asserts the core balance invariant: `amount_paid + amount_due ==
/// total_amount` and `amount_paid >= 0`
///
/// # Panics
///
/// Panics with a descriptive message if the invariant does not hold.
pub fn assert_invoice_consistent(invoice: &Invoice) {
    let paid = invoice.amount_paid.amount();
    let due = invoice.amount_due.amount();
    let total = invoice.total_amount.amount();

    assert_eq!(
        paid + due,
        total,
        "invariant violated for {}: paid {} + due {} != total {}",
        invoice.invoice_number,
        paid,
        due,
        total
    );
    assert!(
        paid >= Decimal::ZERO,
        "invariant violated for {}: amount_paid {} is negative",
        invoice.invoice_number,
        paid
    );
}

/// Asserts the invoice's derived balances
pub fn assert_balances(invoice: &Invoice, paid: Decimal, due: Decimal) {
    assert_eq!(
        invoice.amount_paid.amount(),
        paid,
        "unexpected amount_paid for {}",
        invoice.invoice_number
    );
    assert_eq!(
        invoice.amount_due.amount(),
        due,
        "unexpected amount_due for {}",
        invoice.invoice_number
    );
}
