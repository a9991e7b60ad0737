use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductionOrder::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionOrder::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductionOrder::Os).big_integer().not_null())
                    .col(ColumnDef::new(ProductionOrder::Product).string().not_null())
                    .col(ColumnDef::new(ProductionOrder::Pattern).string().not_null())
                    .col(ColumnDef::new(ProductionOrder::Quantity).integer().not_null())
                    .col(ColumnDef::new(ProductionOrder::DeliveryDate).date().not_null())
                    .col(ColumnDef::new(ProductionOrder::Customer).string().null())
                    .col(ColumnDef::new(ProductionOrder::StageId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_stage")
                            .from(ProductionOrder::Table, ProductionOrder::StageId)
                            .to(Stage::Table, Stage::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductionOrder::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProductionOrder {
    Table,
    Id,
    Os,
    Product,
    Pattern,
    Quantity,
    DeliveryDate,
    Customer,
    StageId,
}

#[derive(Iden)]
enum Stage {
    Table,
    Id,
}
