use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum BankPartners {
    Table,
    Id,
    Name,
    LogoUrl,
    Website,
    Description,
    MinInterestBps,
    MaxInterestBps,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StaticContents {
    Table,
    Id,
    Slug,
    Title,
    Body,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Enquiries {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Subject,
    Message,
    Status,
    AdminNotes,
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
                    .table(BankPartners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankPartners::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankPartners::Name).string().not_null())
                    .col(ColumnDef::new(BankPartners::LogoUrl).string().null())
                    .col(ColumnDef::new(BankPartners::Website).string().null())
                    .col(ColumnDef::new(BankPartners::Description).text().null())
                    .col(ColumnDef::new(BankPartners::MinInterestBps).integer().null())
                    .col(ColumnDef::new(BankPartners::MaxInterestBps).integer().null())
                    .col(
                        ColumnDef::new(BankPartners::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BankPartners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(BankPartners::UpdatedAt)
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
                    .table(StaticContents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StaticContents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StaticContents::Slug)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(StaticContents::Title).string().not_null())
                    .col(ColumnDef::new(StaticContents::Body).text().not_null())
                    .col(
                        ColumnDef::new(StaticContents::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(StaticContents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(StaticContents::UpdatedAt)
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
                    .table(Enquiries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enquiries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enquiries::Name).string().not_null())
                    .col(ColumnDef::new(Enquiries::Email).string().not_null())
                    .col(ColumnDef::new(Enquiries::Phone).string().null())
                    .col(ColumnDef::new(Enquiries::Subject).string().not_null())
                    .col(ColumnDef::new(Enquiries::Message).text().not_null())
                    .col(
                        ColumnDef::new(Enquiries::Status)
                            .custom(Alias::new("enquiry_status"))
                            .not_null()
                            .default("new"),
                    )
                    .col(ColumnDef::new(Enquiries::AdminNotes).text().null())
                    .col(
                        ColumnDef::new(Enquiries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Enquiries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_enquiries_status")
                    .table(Enquiries::Table)
                    .col(Enquiries::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Enquiries::Table.into_iden(),
            StaticContents::Table.into_iden(),
            BankPartners::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
