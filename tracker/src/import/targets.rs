use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
};

use crate::entity::{employee, production_order, stage};

use super::{Record, RowError, RowImporter};

fn reject(msg: impl Into<String>) -> RowError {
    RowError::Rejected(msg.into())
}

fn non_negative(value: i64) -> Option<i32> {
    i32::try_from(value).ok().filter(|v| *v >= 0)
}

// ---------- employees ----------

/// Columns: `nome`, `etapa`, `producao_media`.
pub struct EmployeeRows;

#[async_trait]
impl RowImporter for EmployeeRows {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["nome", "etapa", "producao_media"];

    fn noun(&self) -> &'static str {
        "employees"
    }

    async fn import_row(
        &self,
        txn: &DatabaseTransaction,
        record: &Record<'_>,
    ) -> Result<(), RowError> {
        let name = record
            .text("nome")
            .ok_or_else(|| reject(format!("Row {}: employee name is empty", record.line)))?;

        let stage_name = record.text("etapa").unwrap_or_default();
        let stage = stage::find_by_name(txn, &stage_name).await?.ok_or_else(|| {
            reject(format!(
                "Stage '{stage_name}' not found for employee '{name}'"
            ))
        })?;

        let average_output = record
            .int("producao_media")
            .and_then(non_negative)
            .ok_or_else(|| {
                reject(format!(
                    "Invalid producao_media '{}' for employee '{name}'",
                    record.get("producao_media")
                ))
            })?;

        employee::ActiveModel {
            name: Set(name.clone()),
            stage_id: Set(Some(stage.id)),
            average_output: Set(average_output),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| reject(format!("Error inserting employee '{name}': {e}")))?;

        Ok(())
    }
}

// ---------- orders ----------

/// Columns: `OS`, `produto`, `estampa`, `quantidade`, `data_entrega`,
/// `etapa`, optional `cliente_final`.
pub struct OrderRows;

#[async_trait]
impl RowImporter for OrderRows {
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "OS",
        "produto",
        "estampa",
        "quantidade",
        "data_entrega",
        "etapa",
    ];

    fn noun(&self) -> &'static str {
        "orders"
    }

    async fn import_row(
        &self,
        txn: &DatabaseTransaction,
        record: &Record<'_>,
    ) -> Result<(), RowError> {
        let os = record.int("OS").ok_or_else(|| {
            reject(format!(
                "Row {}: invalid OS '{}'",
                record.line,
                record.get("OS")
            ))
        })?;

        // Also catches repeats earlier in this batch: the lookup runs on the
        // same transaction as the inserts.
        let existing = production_order::Entity::find()
            .filter(production_order::Column::Os.eq(os))
            .one(txn)
            .await?;
        if existing.is_some() {
            return Err(reject(format!(
                "OS '{os}' already exists in the system. Duplicates are not allowed."
            )));
        }

        let product = record.text("produto").unwrap_or_default();

        let stage_name = record.text("etapa").unwrap_or_default();
        let stage = stage::find_by_name(txn, &stage_name).await?.ok_or_else(|| {
            reject(format!(
                "Stage '{stage_name}' not found for product '{product}'"
            ))
        })?;

        if product.is_empty() {
            return Err(reject(format!("OS '{os}': produto is empty")));
        }
        let pattern = record
            .text("estampa")
            .ok_or_else(|| reject(format!("OS '{os}': estampa is empty")))?;

        let quantity = record
            .int("quantidade")
            .and_then(non_negative)
            .ok_or_else(|| {
                reject(format!(
                    "OS '{os}': invalid quantidade '{}'",
                    record.get("quantidade")
                ))
            })?;

        let delivery_date = record.date("data_entrega").ok_or_else(|| {
            reject(format!(
                "OS '{os}': invalid data_entrega '{}'",
                record.get("data_entrega")
            ))
        })?;

        production_order::ActiveModel {
            os: Set(os),
            product: Set(product.clone()),
            pattern: Set(pattern),
            quantity: Set(quantity),
            delivery_date: Set(delivery_date),
            customer: Set(record.text("cliente_final")),
            stage_id: Set(Some(stage.id)),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| reject(format!("Error inserting product '{product}': {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{Cell, ImportError, Sheet, run_import};
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection, PaginatorTrait};

    async fn setup() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn sheet(headers: &[&str], rows: Vec<Vec<Cell>>) -> Sheet {
        Sheet::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    const ORDER_HEADERS: &[&str] = &[
        "OS",
        "produto",
        "estampa",
        "quantidade",
        "data_entrega",
        "cliente_final",
        "etapa",
    ];

    fn order_row(os: i64, product: &str, stage: &str) -> Vec<Cell> {
        vec![
            Cell::Int(os),
            t(product),
            t("Listrado"),
            Cell::Float(100.0),
            Cell::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            t("Loja Centro"),
            t(stage),
        ]
    }

    #[tokio::test]
    async fn employees_import_collects_unknown_stage() {
        let db = setup().await;
        let data = sheet(
            &["nome", "etapa", "producao_media"],
            vec![
                vec![t("Ana"), t("Producao"), Cell::Int(120)],
                vec![t("Bia"), t("Lavanderia"), Cell::Int(80)],
                vec![t("Caio"), t("Elastico"), t("abc")],
            ],
        );

        let report = run_import(&db, &data, &EmployeeRows).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].contains("Lavanderia"));
        assert!(report.errors[0].contains("Bia"));
        assert!(report.errors[1].contains("producao_media"));
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn employees_missing_column_rejects_batch() {
        let db = setup().await;
        let data = sheet(
            &["nome", "etapa"],
            vec![vec![t("Ana"), t("Producao")]],
        );

        let err = run_import(&db, &data, &EmployeeRows).await.unwrap_err();

        assert!(matches!(err, ImportError::MissingColumns { .. }));
        assert!(err.is_client_error());
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn orders_duplicate_os_is_skipped_and_existing_kept() {
        let db = setup().await;
        let first = sheet(ORDER_HEADERS, vec![order_row(1001, "Lencol", "Producao")]);
        run_import(&db, &first, &OrderRows).await.unwrap();

        let again = sheet(
            ORDER_HEADERS,
            vec![
                order_row(1001, "Fronha", "Embalagem"),
                order_row(1002, "Fronha", "Embalagem"),
            ],
        );
        let report = run_import(&db, &again, &OrderRows).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("1001"));

        let kept = production_order::Entity::find()
            .filter(production_order::Column::Os.eq(1001))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].product, "Lencol");
    }

    #[tokio::test]
    async fn orders_duplicate_within_batch() {
        let db = setup().await;
        let data = sheet(
            ORDER_HEADERS,
            vec![
                order_row(7, "Lencol", "Producao"),
                order_row(7, "Lencol", "Producao"),
            ],
        );

        let report = run_import(&db, &data, &OrderRows).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn orders_optional_customer_and_text_dates() {
        let db = setup().await;
        let data = sheet(
            &["OS", "produto", "estampa", "quantidade", "data_entrega", "etapa"],
            vec![vec![
                t("55"),
                t("Jogo de cama"),
                t("Xadrez"),
                t("40"),
                t("2024-11-05"),
                t("OS na fabrica"),
            ]],
        );

        let report = run_import(&db, &data, &OrderRows).await.unwrap();
        assert_eq!(report, crate::import::ImportReport { inserted: 1, errors: vec![] });

        let order = production_order::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(order.os, 55);
        assert_eq!(order.quantity, 40);
        assert_eq!(order.customer, None);
        assert_eq!(
            order.delivery_date,
            NaiveDate::from_ymd_opt(2024, 11, 5).unwrap()
        );
    }

    #[tokio::test]
    async fn orders_negative_quantity_rejected() {
        let db = setup().await;
        let mut row = order_row(9, "Lencol", "Producao");
        row[3] = Cell::Int(-5);
        let data = sheet(ORDER_HEADERS, vec![row]);

        let report = run_import(&db, &data, &OrderRows).await.unwrap();

        assert_eq!(report.inserted, 0);
        assert!(report.errors[0].contains("quantidade"));
    }
}
