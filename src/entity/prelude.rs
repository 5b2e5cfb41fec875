pub use super::cash_withdrawal::Entity as CashWithdrawal;
pub use super::employee::Entity as Employee;
pub use super::shift::Entity as Shift;
pub use super::site::Entity as Site;
pub use super::user::Entity as User;
