//! Spreadsheet bulk import.
//!
//! A batch is validated for required columns up front and then processed row
//! by row inside a single transaction. Rows that fail validation are skipped
//! and reported; the rest are committed together at the end.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use serde::Serialize;

pub mod sheet;
mod targets;

pub use sheet::{Cell, Format, Record, Sheet};
pub use targets::{EmployeeRows, OrderRows};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("File type not allowed")]
    UnsupportedFileType,
    #[error("The file must contain the columns: {}", .required.join(", "))]
    MissingColumns {
        required: &'static [&'static str],
        missing: Vec<String>,
    },
    #[error("Error processing the file: workbook has no sheets")]
    EmptyWorkbook,
    #[error("Error processing the file: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Error processing the file: {0}")]
    Csv(#[from] csv::Error),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl ImportError {
    /// Errors caused by the uploaded content rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFileType | ImportError::MissingColumns { .. }
        )
    }
}

/// Why a single row was not inserted.
#[derive(Debug)]
pub enum RowError {
    /// Reported back to the caller; the batch continues.
    Rejected(String),
    /// Aborts the whole batch.
    Store(DbErr),
}

impl From<DbErr> for RowError {
    fn from(e: DbErr) -> Self {
        RowError::Store(e)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub errors: Vec<String>,
}

/// One import target: which columns it needs and how a row is stored.
#[async_trait]
pub trait RowImporter: Send + Sync {
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Plural noun for log lines and summaries ("employees").
    fn noun(&self) -> &'static str;

    async fn import_row(
        &self,
        txn: &DatabaseTransaction,
        record: &Record<'_>,
    ) -> Result<(), RowError>;
}

/// Runs `importer` over every data row of `sheet` and commits once.
pub async fn run_import<I: RowImporter>(
    db: &DatabaseConnection,
    sheet: &Sheet,
    importer: &I,
) -> Result<ImportReport, ImportError> {
    sheet.require_columns(I::REQUIRED_COLUMNS)?;

    let txn = db.begin().await?;
    let mut report = ImportReport::default();

    // Each row runs under its own savepoint, so a rejected row leaves no
    // partial writes and a failed statement does not poison the batch.
    for record in sheet.records() {
        let row_txn = txn.begin().await?;
        match importer.import_row(&row_txn, &record).await {
            Ok(()) => {
                row_txn.commit().await?;
                report.inserted += 1;
            }
            Err(RowError::Rejected(msg)) => {
                row_txn.rollback().await?;
                tracing::debug!(line = record.line, reason = %msg, "import row skipped");
                report.errors.push(msg);
            }
            Err(RowError::Store(e)) => {
                tracing::error!(line = record.line, error = %e, "import aborted");
                return Err(e.into());
            }
        }
    }

    txn.commit().await?;

    tracing::info!(
        target_rows = importer.noun(),
        inserted = report.inserted,
        skipped = report.errors.len(),
        "import finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::employee;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, EntityTrait, PaginatorTrait, Set};

    /// Writes a row first and decides afterwards whether to keep it.
    struct WriteThenCheck;

    #[async_trait]
    impl RowImporter for WriteThenCheck {
        const REQUIRED_COLUMNS: &'static [&'static str] = &["nome"];

        fn noun(&self) -> &'static str {
            "employees"
        }

        async fn import_row(
            &self,
            txn: &DatabaseTransaction,
            record: &Record<'_>,
        ) -> Result<(), RowError> {
            let name = record.text("nome").unwrap_or_default();
            employee::ActiveModel {
                name: Set(name.clone()),
                stage_id: Set(None),
                average_output: Set(1),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            if name.starts_with('x') {
                return Err(RowError::Rejected(format!("{name} rejected after write")));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn rejected_row_leaves_no_partial_writes() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let sheet = Sheet::new(
            vec!["nome".to_string()],
            vec![
                vec![Cell::text("Ana")],
                vec![Cell::text("xavier")],
                vec![Cell::text("Bia")],
            ],
        );

        let report = run_import(&db, &sheet, &WriteThenCheck).await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.errors, vec!["xavier rejected after write".to_string()]);
        let names: Vec<String> = employee::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Bia"]);
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 2);
    }
}
