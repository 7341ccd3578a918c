use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storefront listing grouping one or more catalog items. A publication with
/// a `preorder_id` sells from the preorder section; otherwise from stock.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub link: String,
    #[sea_orm(nullable)]
    pub preorder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::preorder::Entity",
        from = "Column::PreorderId",
        to = "super::preorder::Column::Id"
    )]
    Preorder,
    #[sea_orm(has_many = "super::catalog_item::Entity")]
    CatalogItems,
}

impl Related<super::preorder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Preorder.def()
    }
}

impl Related<super::catalog_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
