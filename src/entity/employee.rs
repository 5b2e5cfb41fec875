use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EmployeeKind, PaymentMethod};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub kind: EmployeeKind,
    #[sea_orm(column_type = "Text")]
    pub full_name: String,
    pub birth_date: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub position: Option<String>,
    /// Minor units
    pub salary: i64,
    pub payment_method: PaymentMethod,
    pub terminated_at: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub termination_reason: Option<String>,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.terminated_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shift::Entity")]
    Shift,
    #[sea_orm(has_many = "super::cash_withdrawal::Entity")]
    CashWithdrawal,
}

impl Related<super::shift::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shift.def()
    }
}

impl Related<super::cash_withdrawal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashWithdrawal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
