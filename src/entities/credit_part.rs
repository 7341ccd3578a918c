use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One installment of a credit plan. `part_index` 0 is the deposit part,
/// folded into the order's initial invoice at planning time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_parts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub credit_plan_id: Uuid,
    pub part_index: i32,
    /// Installment amount in minor currency units.
    pub sum: i64,
    pub deadline: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_plan::Entity",
        from = "Column::CreditPlanId",
        to = "super::credit_plan::Column::Id"
    )]
    CreditPlan,
}

impl Related<super::credit_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditPlan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
