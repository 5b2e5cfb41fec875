pub mod prelude;

pub mod cash_withdrawal;
pub mod employee;
pub mod sea_orm_active_enums;
pub mod shift;
pub mod site;
pub mod user;
