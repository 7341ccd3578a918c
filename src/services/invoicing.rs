//! Invoice planning: partitions an order total into an initial invoice and
//! optional per-item installment invoices.
//!
//! Pure computation over confirmed checkout lines; persistence happens later
//! in the order service. Deterministic given its input, so every property is
//! unit-testable from literal values.

use std::collections::HashMap;

use uuid::Uuid;

use crate::entities::invoice::{InvoiceStatus, InvoiceType};
use crate::services::catalog::AvailableCheckoutItem;

const INITIAL_INVOICE_TITLE: &str = "Order payment";
const DEPOSIT_INVOICE_TITLE: &str = "Order deposit payment";
const CREDIT_INVOICE_TITLE: &str = "Installment payment";

/// Invoice to be persisted, minus the identifiers assigned at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub title: String,
    pub invoice_type: InvoiceType,
    pub credit_part_index: Option<i32>,
    pub amount: i64,
    pub status: InvoiceStatus,
}

/// Result of planning: one initial invoice plus, per credit-schedule item,
/// its installment invoices sorted ascending by `credit_part_index`.
#[derive(Debug, Clone)]
pub struct InvoicePlan {
    pub initial: InvoiceDraft,
    pub credit: HashMap<Uuid, Vec<InvoiceDraft>>,
}

impl InvoicePlan {
    /// Sum of all planned amounts. Always equals the order total.
    pub fn total(&self) -> i64 {
        self.initial.amount
            + self
                .credit
                .values()
                .flatten()
                .map(|draft| draft.amount)
                .sum::<i64>()
    }
}

/// Plans the invoices for a confirmed checkout batch.
///
/// With no credit selection the whole total goes into a single initial
/// invoice. Otherwise every item carrying a credit schedule is split: part 0
/// folds into the deposit (initial) invoice, parts 1.. become one credit
/// invoice each; items without a schedule contribute their full line amount
/// to the deposit.
pub fn plan_invoices(items: &[AvailableCheckoutItem], credit_item_ids: &[Uuid]) -> InvoicePlan {
    if credit_item_ids.is_empty() {
        let total = items
            .iter()
            .map(|item| item.price * item.quantity)
            .sum::<i64>();
        return InvoicePlan {
            initial: InvoiceDraft {
                title: INITIAL_INVOICE_TITLE.to_string(),
                invoice_type: InvoiceType::Initial,
                credit_part_index: None,
                amount: total,
                status: InvoiceStatus::Unpaid,
            },
            credit: HashMap::new(),
        };
    }

    let mut deposit_total = 0i64;
    let mut credit = HashMap::new();

    for item in items {
        match item.credit_parts.as_deref() {
            Some(parts) if !parts.is_empty() => {
                let mut item_invoices = Vec::with_capacity(parts.len().saturating_sub(1));
                for (index, part) in parts.iter().enumerate() {
                    if index == 0 {
                        deposit_total += part.sum * item.quantity;
                        continue;
                    }
                    item_invoices.push(InvoiceDraft {
                        title: CREDIT_INVOICE_TITLE.to_string(),
                        invoice_type: InvoiceType::Credit,
                        credit_part_index: Some(index as i32),
                        amount: part.sum * item.quantity,
                        status: InvoiceStatus::Unpaid,
                    });
                }
                item_invoices.sort_by_key(|draft| draft.credit_part_index);
                credit.insert(item.id, item_invoices);
            }
            _ => deposit_total += item.price * item.quantity,
        }
    }

    InvoicePlan {
        initial: InvoiceDraft {
            title: DEPOSIT_INVOICE_TITLE.to_string(),
            invoice_type: InvoiceType::Initial,
            credit_part_index: None,
            amount: deposit_total,
            status: InvoiceStatus::Unpaid,
        },
        credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::CreditPaymentPart;
    use chrono::NaiveDate;

    fn item(
        id: Uuid,
        price: i64,
        quantity: i64,
        credit_sums: Option<&[i64]>,
    ) -> AvailableCheckoutItem {
        AvailableCheckoutItem {
            id,
            quantity,
            preorder_id: None,
            price,
            title: format!("Item {id}"),
            credit_parts: credit_sums.map(|sums| {
                sums.iter()
                    .enumerate()
                    .map(|(i, sum)| CreditPaymentPart {
                        sum: *sum,
                        deadline: NaiveDate::from_ymd_opt(2026, 1 + i as u32, 15).unwrap(),
                    })
                    .collect()
            }),
        }
    }

    #[test]
    fn single_initial_invoice_without_credit() {
        let items = vec![
            item(Uuid::new_v4(), 1500, 2, None),
            item(Uuid::new_v4(), 700, 1, None),
        ];

        let plan = plan_invoices(&items, &[]);

        assert_eq!(plan.initial.invoice_type, InvoiceType::Initial);
        assert_eq!(plan.initial.amount, 3700);
        assert_eq!(plan.initial.status, InvoiceStatus::Unpaid);
        assert!(plan.credit.is_empty());
    }

    #[test]
    fn credit_partition_for_three_parts_quantity_three() {
        let credit_id = Uuid::new_v4();
        let items = vec![item(credit_id, 3000, 3, Some(&[1000, 1200, 800]))];

        let plan = plan_invoices(&items, &[credit_id]);

        // Part 0 folds into the deposit.
        assert_eq!(plan.initial.amount, 3000);
        let drafts = &plan.credit[&credit_id];
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].credit_part_index, Some(1));
        assert_eq!(drafts[0].amount, 3600);
        assert_eq!(drafts[1].credit_part_index, Some(2));
        assert_eq!(drafts[1].amount, 2400);
        assert!(drafts
            .iter()
            .all(|d| d.invoice_type == InvoiceType::Credit));
    }

    #[test]
    fn items_without_schedule_contribute_to_deposit() {
        let credit_id = Uuid::new_v4();
        let plain_id = Uuid::new_v4();
        let items = vec![
            item(credit_id, 2000, 1, Some(&[500, 1500])),
            item(plain_id, 900, 2, None),
        ];

        let plan = plan_invoices(&items, &[credit_id]);

        // 500 deposit part + 1800 full plain line.
        assert_eq!(plan.initial.amount, 2300);
        assert_eq!(plan.credit.len(), 1);
        assert_eq!(plan.credit[&credit_id][0].amount, 1500);
    }

    #[test]
    fn invoice_total_conservation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let items = vec![
            item(a, 3000, 3, Some(&[1000, 1200, 800])),
            item(b, 2500, 2, Some(&[500, 1000, 1000])),
            item(c, 990, 4, None),
        ];
        let order_total: i64 = items.iter().map(|i| i.price * i.quantity).sum();

        let plan = plan_invoices(&items, &[a, b]);
        assert_eq!(plan.total(), order_total);

        let plan = plan_invoices(&items, &[]);
        assert_eq!(plan.total(), order_total);
    }

    #[test]
    fn empty_schedule_is_treated_as_no_schedule() {
        let id = Uuid::new_v4();
        let items = vec![item(id, 1000, 2, Some(&[]))];

        let plan = plan_invoices(&items, &[id]);

        assert_eq!(plan.initial.amount, 2000);
        assert!(plan.credit.is_empty());
    }

    #[test]
    fn planning_is_deterministic() {
        let id = Uuid::new_v4();
        let items = vec![item(id, 3000, 1, Some(&[1000, 1000, 1000]))];

        let first = plan_invoices(&items, &[id]);
        let second = plan_invoices(&items, &[id]);

        assert_eq!(first.initial, second.initial);
        assert_eq!(first.credit[&id], second.credit[&id]);
    }
}
