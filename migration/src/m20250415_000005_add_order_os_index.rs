use sea_orm_migration::prelude::*;

/// Lookup index for the OS business key. Not unique: duplicates are rejected
/// on write, not by the schema.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_order_os")
                    .table(ProductionOrder::Table)
                    .col(ProductionOrder::Os)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_os")
                    .table(ProductionOrder::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum ProductionOrder {
    Table,
    Os,
}
