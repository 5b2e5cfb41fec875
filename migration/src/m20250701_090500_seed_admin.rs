use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250701_090000_init::User;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-07-01T09:05:00+00:00");

        // Same digest the login page computes: `password:username`
        let hashed_password = sha2::Sha256::digest(format!("{ADMIN_PASSWORD}:{ADMIN_USERNAME}")).to_vec();

        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns(["created_at", "updated_at", "username", "password", "role"])
                .values([time.clone().into(), time.into(), ADMIN_USERNAME.into(), hashed_password.into(), "admin".into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?
                .to_owned()
            ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete()
                .from_table(User::Table)
                .and_where(Expr::col("username").eq(ADMIN_USERNAME))
                .to_owned()
            ).await?;

        Ok(())
    }
}
