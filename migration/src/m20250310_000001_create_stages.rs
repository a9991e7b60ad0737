use sea_orm_migration::prelude::*;

/// Workflow stages in board order. Sector values are the ones stored by the
/// legacy database (`Inicio`, `Producao`, `Expedicao`, `Fim`).
const SEED: &[(&str, &str)] = &[
    ("OS no email", "Inicio"),
    ("OS na fabrica", "Inicio"),
    ("Producao", "Producao"),
    ("Bainha lencol", "Producao"),
    ("Bainha fronha", "Producao"),
    ("Fechar fronha", "Producao"),
    ("Elastico", "Producao"),
    ("Cortar canto", "Producao"),
    ("Embalagem", "Expedicao"),
    ("Romaneio", "Expedicao"),
    ("Entregue", "Fim"),
    ("Cancelado", "Fim"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stage::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Stage::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Stage::Sector).string().not_null())
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(Stage::Table)
            .columns([Stage::Name, Stage::Sector])
            .on_conflict(OnConflict::column(Stage::Name).do_nothing().to_owned());
        for (name, sector) in SEED {
            seed.values([(*name).into(), (*sector).into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }

        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Stage {
    Table,
    Id,
    Name,
    Sector,
}
