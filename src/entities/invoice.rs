use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Billable unit within an order. Exactly one `Initial` invoice per order;
/// installment purchases add per-item `Credit` invoices ordered by
/// `credit_part_index` (index 0 is folded into the initial invoice).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    #[sea_orm(nullable)]
    pub order_item_id: Option<Uuid>,
    pub title: String,
    #[sea_orm(column_name = "invoice_type")]
    pub invoice_type: InvoiceType,
    #[sea_orm(nullable)]
    pub credit_part_index: Option<i32>,
    /// Amount in minor currency units.
    pub amount: i64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::OrderItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum InvoiceType {
    #[sea_orm(string_value = "INITIAL")]
    Initial,
    #[sea_orm(string_value = "CREDIT")]
    Credit,
    #[sea_orm(string_value = "SHIPPING_FOREIGN")]
    ShippingForeign,
    #[sea_orm(string_value = "SHIPPING_LOCAL")]
    ShippingLocal,
}

/// Invoice settlement state. `Unpaid → Waiting → Paid`, or `Canceled` from
/// either non-terminal state. No transitions out of `Paid`/`Canceled`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "WAITING")]
    Waiting,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

impl InvoiceStatus {
    /// Whether the settlement state machine admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Canceled)
    }
}
