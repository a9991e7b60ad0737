pub use sea_orm_migration::prelude::*;

mod m20250310_000001_create_stages;
mod m20250310_000002_create_production_orders;
mod m20250310_000003_create_employees;
mod m20250402_000004_create_tasks;
mod m20250415_000005_add_order_os_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250310_000001_create_stages::Migration),
            Box::new(m20250310_000002_create_production_orders::Migration),
            Box::new(m20250310_000003_create_employees::Migration),
            Box::new(m20250402_000004_create_tasks::Migration),
            Box::new(m20250415_000005_add_order_os_index::Migration),
        ]
    }
}
