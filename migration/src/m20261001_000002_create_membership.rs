use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MembershipCardTypes {
    Table,
    Id,
    Name,
    Description,
    Price,
    ValidityMonths,
    LoanSupport,
    MaxLoanAmount,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MembershipCards {
    Table,
    Id,
    UserId,
    CardTypeId,
    CardNumber,
    PurchaseDate,
    ExpiryDate,
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
                    .table(MembershipCardTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipCardTypes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MembershipCardTypes::Name).string().not_null())
                    .col(ColumnDef::new(MembershipCardTypes::Description).text().null())
                    .col(
                        ColumnDef::new(MembershipCardTypes::Price)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCardTypes::ValidityMonths)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCardTypes::LoanSupport)
                            .custom(Alias::new("loan_support"))
                            .not_null()
                            .default("any"),
                    )
                    .col(
                        ColumnDef::new(MembershipCardTypes::MaxLoanAmount)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCardTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(MembershipCardTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(MembershipCardTypes::UpdatedAt)
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
                    .table(MembershipCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipCards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MembershipCards::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(MembershipCards::CardTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::CardNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::PurchaseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::Status)
                            .custom(Alias::new("membership_card_status"))
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::PaymentReference)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(MembershipCards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_cards_user")
                            .from(MembershipCards::Table, MembershipCards::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_cards_card_type")
                            .from(MembershipCards::Table, MembershipCards::CardTypeId)
                            .to(MembershipCardTypes::Table, MembershipCardTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_membership_cards_status_expiry")
                    .table(MembershipCards::Table)
                    .col(MembershipCards::Status)
                    .col(MembershipCards::ExpiryDate)
                    .to_owned(),
            )
            .await?;

        // at most one card per user stored as active
        let stmt = Statement::from_string(
            manager.get_database_backend(),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_membership_cards_one_active ON membership_cards(user_id) WHERE status = 'active'".to_owned(),
        );
        manager.get_connection().execute(stmt).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(MembershipCards::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(MembershipCardTypes::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
