pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_membership;
mod m20261001_000003_create_loan_applications;
mod m20261001_000004_create_cash_lending;
mod m20261001_000005_create_reference_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_membership::Migration),
            Box::new(m20261001_000003_create_loan_applications::Migration),
            Box::new(m20261001_000004_create_cash_lending::Migration),
            Box::new(m20261001_000005_create_reference_tables::Migration),
        ]
    }
}
