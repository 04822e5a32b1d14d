pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_cars_table;
mod m20260301_000002_create_driver_assignments_table;
mod m20260301_000003_create_rentals_table;
mod m20260301_000004_create_payments_table;
mod m20260301_000005_create_payment_distributions_table;
mod m20260305_000001_add_dispatch_indexes;
mod m20260310_000001_unique_active_assignment;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_cars_table::Migration),
            Box::new(m20260301_000002_create_driver_assignments_table::Migration),
            Box::new(m20260301_000003_create_rentals_table::Migration),
            Box::new(m20260301_000004_create_payments_table::Migration),
            Box::new(m20260301_000005_create_payment_distributions_table::Migration),
            Box::new(m20260305_000001_add_dispatch_indexes::Migration),
            Box::new(m20260310_000001_unique_active_assignment::Migration),
        ]
    }
}
