use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery record owned by an order (0..1). `address_identifier` holds the
/// carrier's pickup-point code where applicable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deliveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service: DeliveryService,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    #[sea_orm(nullable)]
    pub address_identifier: Option<String>,
    #[sea_orm(nullable)]
    pub recipient_name: Option<String>,
    #[sea_orm(nullable)]
    pub recipient_phone: Option<String>,
    #[sea_orm(nullable)]
    pub track_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
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
pub enum DeliveryService {
    #[sea_orm(string_value = "CDEK")]
    Cdek,
    #[sea_orm(string_value = "SELF_PICKUP")]
    SelfPickup,
}

impl DeliveryService {
    /// Public tracking page for the carrier, if it exposes one.
    pub fn tracking_link(self, track_code: &str) -> Option<String> {
        match self {
            Self::Cdek => Some(format!(
                "https://www.cdek.ru/ru/tracking/?order_id={track_code}"
            )),
            Self::SelfPickup => None,
        }
    }
}
