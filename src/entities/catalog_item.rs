use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purchasable unit: a product priced and stocked within one publication.
///
/// Stock accounting happens on this row: `quantity` is the capacity
/// (NULL = unbounded) and `ordered_quantity` the reserved share. The table
/// carries a CHECK constraint enforcing
/// `quantity IS NULL OR ordered_quantity <= quantity`; reservation code
/// relies on that constraint, not on application-level checks, to detect
/// oversell under concurrency.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub publication_id: Uuid,
    pub product_id: Uuid,
    #[sea_orm(nullable)]
    pub credit_plan_id: Option<Uuid>,
    /// Unit price in minor currency units.
    pub price: i64,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub quantity: Option<i64>,
    pub ordered_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::publication::Entity",
        from = "Column::PublicationId",
        to = "super::publication::Column::Id"
    )]
    Publication,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::credit_plan::Entity",
        from = "Column::CreditPlanId",
        to = "super::credit_plan::Column::Id"
    )]
    CreditPlan,
}

impl Related<super::publication::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publication.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::credit_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditPlan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
