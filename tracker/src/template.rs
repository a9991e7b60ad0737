//! Example workbooks handed out to users before an import.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::import::{EmployeeRows, OrderRows, RowImporter};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Clone, Copy, Debug)]
pub enum Example {
    Text(&'static str),
    Number(f64),
}

/// Header row plus one example row.
#[derive(Debug)]
pub struct Template {
    pub file_name: &'static str,
    pub columns: &'static [(&'static str, Example)],
}

pub const EMPLOYEES: Template = Template {
    file_name: "template_employees.xlsx",
    columns: &[
        ("nome", Example::Text("Nome do Funcionario")),
        ("etapa", Example::Text("Nome da Etapa")),
        ("producao_media", Example::Number(100.0)),
    ],
};

pub const ORDERS: Template = Template {
    file_name: "template_orders.xlsx",
    columns: &[
        ("OS", Example::Number(1001.0)),
        ("produto", Example::Text("Nome do Produto")),
        ("estampa", Example::Text("Descricao da Estampa")),
        ("quantidade", Example::Number(100.0)),
        ("data_entrega", Example::Text("2023-12-31")),
        ("cliente_final", Example::Text("Nome do Cliente")),
        ("etapa", Example::Text("Nome da Etapa")),
    ],
};

impl Template {
    pub fn headers(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|(name, _)| *name)
    }

    /// Writes the workbook into memory.
    pub fn render(&self) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();

        for (idx, (name, example)) in self.columns.iter().enumerate() {
            let col = idx as u16;
            worksheet.write_string_with_format(0, col, *name, &header)?;
            match example {
                Example::Text(s) => worksheet.write_string(1, col, *s)?,
                Example::Number(n) => worksheet.write_number(1, col, *n)?,
            };
            worksheet.set_column_width(col, 22)?;
        }

        workbook.save_to_buffer()
    }
}

// Keep templates in step with what the importer demands.
const _: () = {
    assert!(EMPLOYEES.columns.len() == EmployeeRows::REQUIRED_COLUMNS.len());
    assert!(ORDERS.columns.len() == OrderRows::REQUIRED_COLUMNS.len() + 1);
};
