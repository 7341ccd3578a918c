//! Catalog reads and stock reservation.
//!
//! Checkout verification is advisory: it reports what the store could
//! fulfill at read time without holding anything. The only binding step is
//! [`CatalogService::reserve_items`], which locks the stock rows and lets
//! the CHECK constraint on `ordered_quantity` arbitrate oversell.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    catalog_item, credit_part, product, publication, CatalogItem, CreditPart, Product, Publication,
};
use crate::errors::{is_quantity_check_violation, ServiceError};
use crate::events::{Event, EventSender};

/// One line of an incoming checkout request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct CheckoutItemRequest {
    pub id: Uuid,
    pub quantity: i64,
}

/// One installment of the credit schedule attached to a checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreditPaymentPart {
    /// Amount in minor currency units.
    pub sum: i64,
    pub deadline: NaiveDate,
}

/// Checkout line the store can fulfill as requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AvailableCheckoutItem {
    pub id: Uuid,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preorder_id: Option<Uuid>,
    /// Unit price in minor currency units.
    pub price: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_parts: Option<Vec<CreditPaymentPart>>,
}

/// Checkout line the store had to cap below the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdjustedCheckoutItem {
    pub id: Uuid,
    /// Quantity the store can offer right now (possibly zero).
    pub quantity: i64,
}

/// Verification outcome: the requested lines partitioned into fulfillable
/// and capped ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckoutData {
    pub available_items: Vec<AvailableCheckoutItem>,
    pub adjusted_items: Vec<AdjustedCheckoutItem>,
}

/// Catalog row joined with everything checkout needs to know about it.
#[derive(Debug, Clone)]
struct LoadedItem {
    preorder_id: Option<Uuid>,
    price: i64,
    title: String,
    available: Option<i64>,
    credit_parts: Option<Vec<CreditPaymentPart>>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    max_cart_item_quantity: i64,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, max_cart_item_quantity: i64) -> Self {
        Self {
            db,
            event_sender,
            max_cart_item_quantity,
        }
    }

    /// Verifies a checkout request against the catalog.
    ///
    /// All referenced items must exist and be active, and must belong to the
    /// same section (one preorder, or all regular stock). The result is a
    /// snapshot: nothing is reserved until order creation.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn verify_checkout(
        &self,
        items: &[CheckoutItemRequest],
    ) -> Result<CheckoutData, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "checkout requires at least one item".to_string(),
            ));
        }
        let mut seen = HashMap::with_capacity(items.len());
        for line in items {
            if line.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for item {} must be positive",
                    line.id
                )));
            }
            if seen.insert(line.id, line.quantity).is_some() {
                return Err(ServiceError::ValidationError(format!(
                    "item {} is listed more than once",
                    line.id
                )));
            }
        }

        let loaded = self.load_checkout_items(&seen.keys().copied().collect::<Vec<_>>()).await?;

        let first_section = loaded
            .values()
            .next()
            .map(|item| item.preorder_id);
        if let Some(section) = first_section {
            if loaded.values().any(|item| item.preorder_id != section) {
                return Err(ServiceError::MixedSections);
            }
        }

        Ok(partition_items(items, &loaded, self.max_cart_item_quantity))
    }

    /// Reserves stock for the given quantities, all or nothing.
    ///
    /// Locks the stock rows (sorted by id so concurrent reservations cannot
    /// deadlock) and bumps `ordered_quantity`; the CHECK constraint rejects
    /// the update when any line would oversell.
    #[instrument(skip(self, quantities), fields(lines = quantities.len()))]
    pub async fn reserve_items(
        &self,
        quantities: &HashMap<Uuid, i64>,
    ) -> Result<(), ServiceError> {
        if quantities.is_empty() {
            return Err(ServiceError::CheckoutDataEmpty);
        }

        let mut ids: Vec<Uuid> = quantities.keys().copied().collect();
        ids.sort();

        let txn = self.db.begin().await?;

        let mut query = CatalogItem::find()
            .filter(catalog_item::Column::Id.is_in(ids.clone()))
            .order_by_asc(catalog_item::Column::Id);
        // SQLite serializes writers itself and rejects FOR UPDATE.
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        let rows = query.all(&txn).await?;
        if rows.len() != ids.len() {
            return Err(ServiceError::NotFound(
                "one or more catalog items no longer exist".to_string(),
            ));
        }

        for row in rows {
            let next = row.ordered_quantity + quantities[&row.id];
            let mut active: catalog_item::ActiveModel = row.into();
            active.ordered_quantity = Set(next);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await.map_err(|err| {
                if is_quantity_check_violation(&err) {
                    ServiceError::InsufficientStock(
                        "requested quantity exceeds remaining stock".to_string(),
                    )
                } else {
                    ServiceError::DatabaseError(err)
                }
            })?;
        }

        txn.commit().await?;

        info!(items = ids.len(), "reserved stock");
        self.event_sender
            .send(Event::InventoryReserved { item_ids: ids })
            .await;
        Ok(())
    }

    /// Loads the catalog rows for every requested id, with product titles,
    /// section membership and credit schedules. Missing or inactive items
    /// fail the whole batch.
    async fn load_checkout_items(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, LoadedItem>, ServiceError> {
        let rows = CatalogItem::find()
            .filter(catalog_item::Column::Id.is_in(ids.to_vec()))
            .filter(catalog_item::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await?;
        if rows.len() != ids.len() {
            return Err(ServiceError::NotFound(
                "one or more catalog items do not exist or are inactive".to_string(),
            ));
        }

        let product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
        let titles: HashMap<Uuid, String> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|p| (p.id, p.title))
            .collect();

        let publication_ids: Vec<Uuid> = rows.iter().map(|r| r.publication_id).collect();
        let sections: HashMap<Uuid, Option<Uuid>> = Publication::find()
            .filter(publication::Column::Id.is_in(publication_ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|p| (p.id, p.preorder_id))
            .collect();

        let plan_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.credit_plan_id).collect();
        let mut schedules: HashMap<Uuid, Vec<CreditPaymentPart>> = HashMap::new();
        if !plan_ids.is_empty() {
            let parts = CreditPart::find()
                .filter(credit_part::Column::CreditPlanId.is_in(plan_ids))
                .order_by_asc(credit_part::Column::PartIndex)
                .all(self.db.as_ref())
                .await?;
            for part in parts {
                schedules
                    .entry(part.credit_plan_id)
                    .or_default()
                    .push(CreditPaymentPart {
                        sum: part.sum,
                        deadline: part.deadline,
                    });
            }
        }

        let mut loaded = HashMap::with_capacity(rows.len());
        for row in rows {
            let title = titles.get(&row.product_id).cloned().ok_or_else(|| {
                ServiceError::NotFound(format!("product for catalog item {} not found", row.id))
            })?;
            let preorder_id = sections.get(&row.publication_id).copied().ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "publication for catalog item {} not found",
                    row.id
                ))
            })?;
            loaded.insert(
                row.id,
                LoadedItem {
                    preorder_id,
                    price: row.price,
                    title,
                    available: row.quantity.map(|q| q - row.ordered_quantity),
                    credit_parts: row.credit_plan_id.and_then(|plan| schedules.get(&plan).cloned()),
                },
            );
        }
        Ok(loaded)
    }
}

/// Splits the requested lines into fulfillable and capped ones. The offered
/// quantity is bounded by both remaining stock (when tracked) and the
/// per-line cart limit.
fn partition_items(
    requested: &[CheckoutItemRequest],
    loaded: &HashMap<Uuid, LoadedItem>,
    max_cart_item_quantity: i64,
) -> CheckoutData {
    let mut data = CheckoutData::default();
    for line in requested {
        let item = &loaded[&line.id];
        let cap = item
            .available
            .map_or(max_cart_item_quantity, |available| {
                available.clamp(0, max_cart_item_quantity)
            });
        if line.quantity <= cap {
            data.available_items.push(AvailableCheckoutItem {
                id: line.id,
                quantity: line.quantity,
                preorder_id: item.preorder_id,
                price: item.price,
                title: item.title.clone(),
                credit_parts: item.credit_parts.clone(),
            });
        } else {
            data.adjusted_items.push(AdjustedCheckoutItem {
                id: line.id,
                quantity: cap,
            });
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(price: i64, available: Option<i64>) -> LoadedItem {
        LoadedItem {
            preorder_id: None,
            price,
            title: "Test pressing".to_string(),
            available,
            credit_parts: None,
        }
    }

    #[test]
    fn partition_keeps_fulfillable_lines() {
        let id = Uuid::new_v4();
        let mut map = HashMap::new();
        map.insert(id, loaded(1500, Some(5)));

        let data = partition_items(&[CheckoutItemRequest { id, quantity: 3 }], &map, 10);

        assert_eq!(data.available_items.len(), 1);
        assert_eq!(data.available_items[0].quantity, 3);
        assert!(data.adjusted_items.is_empty());
    }

    #[test]
    fn partition_caps_to_remaining_stock() {
        let id = Uuid::new_v4();
        let mut map = HashMap::new();
        map.insert(id, loaded(1500, Some(2)));

        let data = partition_items(&[CheckoutItemRequest { id, quantity: 4 }], &map, 10);

        assert!(data.available_items.is_empty());
        assert_eq!(data.adjusted_items, vec![AdjustedCheckoutItem { id, quantity: 2 }]);
    }

    #[test]
    fn partition_caps_to_cart_limit_when_stock_unbounded() {
        let id = Uuid::new_v4();
        let mut map = HashMap::new();
        map.insert(id, loaded(1500, None));

        let data = partition_items(&[CheckoutItemRequest { id, quantity: 11 }], &map, 10);

        assert_eq!(data.adjusted_items, vec![AdjustedCheckoutItem { id, quantity: 10 }]);
    }

    #[test]
    fn partition_reports_zero_for_sold_out_lines() {
        let id = Uuid::new_v4();
        let mut map = HashMap::new();
        map.insert(id, loaded(1500, Some(0)));

        let data = partition_items(&[CheckoutItemRequest { id, quantity: 1 }], &map, 10);

        assert_eq!(data.adjusted_items, vec![AdjustedCheckoutItem { id, quantity: 0 }]);
    }
}
