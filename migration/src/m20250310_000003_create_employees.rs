use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employee::Name).string().not_null())
                    .col(ColumnDef::new(Employee::StageId).integer().null())
                    .col(ColumnDef::new(Employee::AverageOutput).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_stage")
                            .from(Employee::Table, Employee::StageId)
                            .to(Stage::Table, Stage::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Employee {
    Table,
    Id,
    Name,
    StageId,
    AverageOutput,
}

#[derive(Iden)]
enum Stage {
    Table,
    Id,
}
