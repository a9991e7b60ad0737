//! Tabular upload parsing. The first sheet of a workbook (or the whole CSV
//! file) becomes a [`Sheet`]: a trimmed header row plus typed cells.

use std::fmt;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};

use super::ImportError;

/// Upload formats accepted by the importer, keyed by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Workbook,
    Csv,
}

impl Format {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xls" => Some(Format::Workbook),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Text cell, or `Empty` when the trimmed text is blank.
    pub fn text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            other => Some(other.to_string()),
        }
    }

    /// Integers, whole floats (`100.0`) and numeric text.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) => whole(*f),
            Cell::Text(s) => s
                .parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole)),
            _ => None,
        }
    }

    /// Calendar dates, date-times (time dropped) and `YYYY-MM-DD`,
    /// `YYYY-MM-DD HH:MM:SS` or `DD/MM/YYYY` text.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_date(s),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => match whole(*v) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{v}"),
            },
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(v) if v.time() == chrono::NaiveTime::MIN => Cell::Date(v.date()),
                Some(v) => Cell::DateTime(v),
                None => Cell::Float(dt.as_f64()),
            },
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

fn whole(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok())
}

// ---------- sheet ----------

#[derive(Clone, Debug, Default)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Self { headers, rows }
    }

    /// Parses an uploaded file, choosing the reader from the file extension.
    pub fn from_upload(file_name: &str, bytes: &[u8]) -> Result<Self, ImportError> {
        match Format::from_file_name(file_name) {
            Some(Format::Workbook) => Self::from_workbook(bytes),
            Some(Format::Csv) => Self::from_csv(bytes),
            None => Err(ImportError::UnsupportedFileType),
        }
    }

    /// First worksheet of an xlsx/xls workbook.
    pub fn from_workbook(bytes: &[u8]) -> Result<Self, ImportError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ImportError::EmptyWorkbook)??;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|c| Cell::from(c).to_string()).collect())
            .unwrap_or_default();
        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();

        Ok(Self::new(headers, rows))
    }

    /// Comma- or semicolon-separated text with a header line.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, ImportError> {
        let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        let delimiter = if !first_line.contains(&b',') && first_line.contains(&b';') {
            b';'
        } else {
            b','
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(Cell::text).collect());
        }

        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Fails with every expected column listed when any of them is absent.
    pub fn require_columns(&self, required: &'static [&'static str]) -> Result<(), ImportError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| self.column(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns { required, missing })
        }
    }

    /// Data rows, skipping rows where every cell is empty.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(Cell::is_empty))
            .map(move |(idx, cells)| Record {
                // header is line 1
                line: idx + 2,
                sheet: self,
                cells,
            })
    }
}

/// One data row, addressed by header name.
pub struct Record<'a> {
    pub line: usize,
    sheet: &'a Sheet,
    cells: &'a [Cell],
}

impl Record<'_> {
    /// The cell under `column`; `Empty` for unknown columns and short rows.
    pub fn get(&self, column: &str) -> &Cell {
        self.sheet
            .column(column)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(&EMPTY)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).as_text()
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).as_int()
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).as_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_by_extension() {
        assert_eq!(Format::from_file_name("orders.XLSX"), Some(Format::Workbook));
        assert_eq!(Format::from_file_name("old.xls"), Some(Format::Workbook));
        assert_eq!(Format::from_file_name("a.b.csv"), Some(Format::Csv));
        assert_eq!(Format::from_file_name("notes.txt"), None);
        assert_eq!(Format::from_file_name("xlsx"), None);
    }

    #[test]
    fn int_accepts_whole_floats_and_text() {
        assert_eq!(Cell::Int(7).as_int(), Some(7));
        assert_eq!(Cell::Float(100.0).as_int(), Some(100));
        assert_eq!(Cell::Float(2.5).as_int(), None);
        assert_eq!(Cell::text(" 1001 ").as_int(), Some(1001));
        assert_eq!(Cell::text("12.0").as_int(), Some(12));
        assert_eq!(Cell::text("doze").as_int(), None);
        assert_eq!(Cell::Empty.as_int(), None);
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31);
        assert_eq!(Cell::text("2023-12-31").as_date(), expected);
        assert_eq!(Cell::text("2023-12-31 00:00:00").as_date(), expected);
        assert_eq!(Cell::text("31/12/2023").as_date(), expected);
        assert_eq!(
            Cell::DateTime(expected.unwrap().and_hms_opt(8, 30, 0).unwrap()).as_date(),
            expected
        );
        assert_eq!(Cell::text("amanha").as_date(), None);
    }

    #[test]
    fn float_cells_display_without_trailing_zero() {
        assert_eq!(Cell::Float(1001.0).to_string(), "1001");
        assert_eq!(Cell::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn csv_with_semicolons_and_blank_rows() {
        let data = "\u{feff}nome; etapa ;producao_media\nAna;Producao;120\n;;\nBia;Elastico;80\n";
        let sheet = Sheet::from_csv(data.as_bytes()).unwrap();

        assert_eq!(sheet.headers(), ["nome", "etapa", "producao_media"]);
        let records: Vec<_> = sheet.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].text("nome").as_deref(), Some("Ana"));
        assert_eq!(records[0].int("producao_media"), Some(120));
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].text("etapa").as_deref(), Some("Elastico"));
    }

    #[test]
    fn short_rows_and_unknown_columns_read_as_empty() {
        let sheet = Sheet::new(
            vec!["OS".into(), "produto".into()],
            vec![vec![Cell::Int(5)]],
        );
        let record = sheet.records().next().unwrap();
        assert!(record.get("produto").is_empty());
        assert!(record.get("cliente_final").is_empty());
    }

    #[test]
    fn require_columns_reports_missing() {
        let sheet = Sheet::new(vec!["nome".into(), "etapa".into()], vec![]);
        let err = sheet
            .require_columns(&["nome", "etapa", "producao_media"])
            .unwrap_err();
        match &err {
            ImportError::MissingColumns { missing, .. } => {
                assert_eq!(missing, &vec!["producao_media".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "The file must contain the columns: nome, etapa, producao_media"
        );
    }

    #[test]
    fn garbage_workbook_is_an_error() {
        assert!(Sheet::from_workbook(b"definitely not a zip").is_err());
    }
}
