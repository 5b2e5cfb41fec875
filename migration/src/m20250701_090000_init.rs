use sea_orm_migration::prelude::*;

use crate::util::{default_table_statement, money_column, DefaultColumn};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // SHA-256 of `password:username`
                .col(ColumnDef::new(User::Role)
                    .string_len(16)
                    .not_null())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Employee::Table)
                .col(ColumnDef::new(Employee::Kind)
                    .string_len(16)
                    .not_null())
                .col(ColumnDef::new(Employee::FullName)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Employee::BirthDate)
                    .date())
                .col(ColumnDef::new(Employee::Position)
                    .text())
                .col(money_column(Employee::Salary))
                .col(ColumnDef::new(Employee::PaymentMethod)
                    .string_len(16)
                    .not_null())
                .col(ColumnDef::new(Employee::TerminatedAt)
                    .date())
                .col(ColumnDef::new(Employee::TerminationReason)
                    .text())
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Site::Table)
                .col(ColumnDef::new(Site::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(Site::Address)
                    .text()
                    .not_null()
                    .default(""))
                .col(money_column(Site::HourlyRate))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Shift::Table)
                .col(ColumnDef::new(Shift::EmployeeId)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Shift::SiteId)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Shift::Date)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Shift::Hours)
                    .integer()
                    .not_null())
                .col(money_column(Shift::HourlyRate)) // copied from the site when scheduled
                .col(ColumnDef::new(Shift::IsAbsent)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(Shift::AbsentComment)
                    .text())
                .col(money_column(Shift::Bonus))
                .col(ColumnDef::new(Shift::BonusComment)
                    .text())
                .col(money_column(Shift::Deduction))
                .foreign_key(ForeignKey::create()
                    .from(Shift::Table, Shift::EmployeeId)
                    .to(Employee::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade))
                .foreign_key(ForeignKey::create()
                    .from(Shift::Table, Shift::SiteId)
                    .to(Site::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade))
                .take()
            ).await?;

        manager
            .create_index(Index::create()
                .if_not_exists()
                .name("idx_shift_date")
                .table(Shift::Table)
                .col(Shift::Date)
                .to_owned()
            ).await?;

        manager
            .create_index(Index::create()
                .if_not_exists()
                .name("idx_shift_employee_date")
                .table(Shift::Table)
                .col(Shift::EmployeeId)
                .col(Shift::Date)
                .to_owned()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(CashWithdrawal::Table)
                .col(ColumnDef::new(CashWithdrawal::EmployeeId)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(CashWithdrawal::SiteId)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(CashWithdrawal::Date)
                    .date()
                    .not_null())
                .col(money_column(CashWithdrawal::Amount))
                .col(ColumnDef::new(CashWithdrawal::Comment)
                    .text())
                .foreign_key(ForeignKey::create()
                    .from(CashWithdrawal::Table, CashWithdrawal::EmployeeId)
                    .to(Employee::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade))
                .foreign_key(ForeignKey::create()
                    .from(CashWithdrawal::Table, CashWithdrawal::SiteId)
                    .to(Site::Table, DefaultColumn::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade))
                .take()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(
            TableDropStatement::new()
                .table(CashWithdrawal::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(Shift::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(Site::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(Employee::Table)
                .take()
        ).await?;

        manager.drop_table(
            TableDropStatement::new()
                .table(User::Table)
                .take()
        ).await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum User {
    Table,
    Username,
    Password,
    Role,
}

#[derive(DeriveIden)]
enum Employee {
    Table,
    Kind,
    FullName,
    BirthDate,
    Position,
    Salary,
    PaymentMethod,
    TerminatedAt,
    TerminationReason,
}

#[derive(DeriveIden)]
enum Site {
    Table,
    Name,
    Address,
    HourlyRate,
}

#[derive(DeriveIden)]
enum Shift {
    Table,
    EmployeeId,
    SiteId,
    Date,
    Hours,
    HourlyRate,
    IsAbsent,
    AbsentComment,
    Bonus,
    BonusComment,
    Deduction,
}

#[derive(DeriveIden)]
enum CashWithdrawal {
    Table,
    EmployeeId,
    SiteId,
    Date,
    Amount,
    Comment,
}
