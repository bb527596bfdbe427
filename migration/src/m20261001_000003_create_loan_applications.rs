use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MembershipCards {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum LoanApplications {
    Table,
    Id,
    ApplicationNumber,
    UserId,
    MembershipCardId,
    LoanType,
    AmountRequested,
    AmountApproved,
    InterestRateProposedBps,
    InterestRateFinalBps,
    TenureMonthsRequested,
    TenureMonthsFinal,
    ProcessingFee,
    Purpose,
    Status,
    ApplicationDate,
    DocumentsSubmitted,
    AdminRemarks,
    RejectionReason,
    ReviewedBy,
    ApprovedDate,
    DisbursedDate,
    ClosedDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Amounts are minor currency units, rates are basis points.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoanApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanApplications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::ApplicationNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::MembershipCardId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::LoanType)
                            .custom(Alias::new("loan_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::AmountRequested)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::AmountApproved)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::InterestRateProposedBps)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::InterestRateFinalBps)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::TenureMonthsRequested)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::TenureMonthsFinal)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::ProcessingFee)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(LoanApplications::Purpose).string().null())
                    .col(
                        ColumnDef::new(LoanApplications::Status)
                            .custom(Alias::new("loan_status"))
                            .not_null()
                            .default("submitted"),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::ApplicationDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::DocumentsSubmitted)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(ColumnDef::new(LoanApplications::AdminRemarks).text().null())
                    .col(
                        ColumnDef::new(LoanApplications::RejectionReason)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::ReviewedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::ApprovedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::DisbursedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::ClosedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(LoanApplications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loan_applications_user")
                            .from(LoanApplications::Table, LoanApplications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loan_applications_membership_card")
                            .from(LoanApplications::Table, LoanApplications::MembershipCardId)
                            .to(MembershipCards::Table, MembershipCards::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loan_applications_reviewer")
                            .from(LoanApplications::Table, LoanApplications::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loan_applications_user")
                    .table(LoanApplications::Table)
                    .col(LoanApplications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_loan_applications_status")
                    .table(LoanApplications::Table)
                    .col(LoanApplications::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(LoanApplications::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
