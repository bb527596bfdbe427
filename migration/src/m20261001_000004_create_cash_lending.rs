use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CashLendingPlans {
    Table,
    Id,
    Name,
    Description,
    Price,
    DurationMonths,
    MaxLendingAmount,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CashLendingSubscriptions {
    Table,
    Id,
    UserId,
    PlanId,
    StartDate,
    EndDate,
    Status,
    PaymentReference,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashLendingPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashLendingPlans::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashLendingPlans::Name).string().not_null())
                    .col(ColumnDef::new(CashLendingPlans::Description).text().null())
                    .col(ColumnDef::new(CashLendingPlans::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(CashLendingPlans::DurationMonths)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingPlans::MaxLendingAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingPlans::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CashLendingPlans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(CashLendingPlans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CashLendingSubscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::PlanId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::Status)
                            .custom(Alias::new("subscription_status"))
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::PaymentReference)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(CashLendingSubscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_lending_subscriptions_user")
                            .from(CashLendingSubscriptions::Table, CashLendingSubscriptions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cash_lending_subscriptions_plan")
                            .from(CashLendingSubscriptions::Table, CashLendingSubscriptions::PlanId)
                            .to(CashLendingPlans::Table, CashLendingPlans::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cash_lending_subscriptions_user_status")
                    .table(CashLendingSubscriptions::Table)
                    .col(CashLendingSubscriptions::UserId)
                    .col(CashLendingSubscriptions::Status)
                    .to_owned(),
            )
            .await?;

        // at most one subscription per user stored as active
        let stmt = Statement::from_string(
            manager.get_database_backend(),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_cash_lending_subscriptions_one_active ON cash_lending_subscriptions(user_id) WHERE status = 'active'".to_owned(),
        );
        manager.get_connection().execute(stmt).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(CashLendingSubscriptions::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(CashLendingPlans::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
