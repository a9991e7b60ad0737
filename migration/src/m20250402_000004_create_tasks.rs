use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Task::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Task::OrderId).integer().not_null())
                    .col(ColumnDef::new(Task::StageId).integer().not_null())
                    .col(ColumnDef::new(Task::Description).string().not_null())
                    .col(ColumnDef::new(Task::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(Task::Status)
                            .string()
                            .not_null()
                            .default("pendente"),
                    )
                    .col(
                        ColumnDef::new(Task::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Task::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_order")
                            .from(Task::Table, Task::OrderId)
                            .to(ProductionOrder::Table, ProductionOrder::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_stage")
                            .from(Task::Table, Task::StageId)
                            .to(Stage::Table, Stage::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_order")
                    .table(Task::Table)
                    .col(Task::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Task {
    Table,
    Id,
    OrderId,
    StageId,
    Description,
    Quantity,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProductionOrder {
    Table,
    Id,
}

#[derive(Iden)]
enum Stage {
    Table,
    Id,
}
