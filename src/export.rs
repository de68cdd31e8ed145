//! Serializes the currently visible record rows to a downloadable file
//! (CSV, JSON, XLSX or PDF) chosen through a save dialog.
//!
//! CSV and JSON are encoded here; XLSX and PDF delegate to external encoders
//! (`rust_xlsxwriter`, `printpdf`).

use crate::{PathExtension, QueryRunnerError, QueryRunnerResult, Record, Value};

use egui::Context;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rfd::AsyncFileDialog;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use tokio::sync::oneshot;
use tracing::error;

/// A target export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Xlsx,
        ExportFormat::Pdf,
    ];

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Display name used in the export menu and dialog filters.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Pdf => "PDF",
        }
    }

    /// Maps a chosen save path back to a format via its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension_as_lowercase().as_deref() {
            Some("csv") => Some(ExportFormat::Csv),
            Some("json") => Some(ExportFormat::Json),
            Some("xlsx") => Some(ExportFormat::Xlsx),
            Some("pdf") => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    /// Default file name for this format. The CSV action historically names
    /// its download after the table; the other formats default to `data`.
    pub fn default_file_name(&self, table: &str) -> String {
        match self {
            ExportFormat::Csv => format!("{table}_query_results.csv"),
            _ => format!("data.{}", self.extension()),
        }
    }
}

/// Encodes one cell as a CSV field. Every field (numbers included) is
/// wrapped in double quotes; embedded quotes are doubled; embedded newlines
/// are collapsed to a single space; nulls render as an empty quoted field;
/// timestamps render as RFC 3339 instants.
fn csv_field(value: &Value) -> String {
    let text = value.display().replace('"', "\"\"").replace('\n', " ");
    format!("\"{text}\"")
}

/// Builds the CSV document for the given rows. The header row is the keys of
/// the first record, in first-seen order; lines are joined with `\n`.
pub fn csv_string(rows: &[Record]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let headers: Vec<&str> = first.keys().collect();
    let mut lines: Vec<String> = Vec::with_capacity(rows.len() + 1);

    lines.push(
        headers
            .iter()
            .map(|h| csv_field(&Value::Str(h.to_string())))
            .collect::<Vec<String>>()
            .join(","),
    );

    for row in rows {
        let fields: Vec<String> = headers
            .iter()
            .map(|header| csv_field(row.get(header).unwrap_or(&Value::Null)))
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

/// Builds the JSON document: a pretty-printed dump of the full record array
/// with two-space indentation.
pub fn json_string(rows: &[Record]) -> QueryRunnerResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Writes the rows as an XLSX workbook with a single "Data" worksheet:
/// header row plus one row per record.
fn write_xlsx(rows: &[Record], path: &Path) -> QueryRunnerResult<()> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Data")?;

    let Some(first) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().collect();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (row_index, row) in rows.iter().enumerate() {
        for (col, header) in headers.iter().enumerate() {
            let value = row.get(header).unwrap_or(&Value::Null);
            match value {
                Value::Int(i) => {
                    worksheet.write_number(row_index as u32 + 1, col as u16, *i as f64)?;
                }
                Value::Float(f) => {
                    worksheet.write_number(row_index as u32 + 1, col as u16, *f)?;
                }
                other => {
                    worksheet.write_string(row_index as u32 + 1, col as u16, other.display())?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes the rows as a simple paginated PDF: a title line followed by one
/// monospaced line per record.
fn write_pdf(rows: &[Record], path: &Path, title: &str) -> QueryRunnerResult<()> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|err| QueryRunnerError::Pdf(err.to_string()))?;
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| QueryRunnerError::Pdf(err.to_string()))?;

    let mut current_layer = doc.get_page(page).get_layer(layer);
    let mut y = 282.0;
    current_layer.use_text(title, 14.0, Mm(10.0), Mm(y), &title_font);
    y -= 10.0;

    let Some(first) = rows.first() else {
        doc.save(&mut BufWriter::new(File::create(path)?))
            .map_err(|err| QueryRunnerError::Pdf(err.to_string()))?;
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().collect();

    let mut lines: Vec<String> = vec![headers.join(" | ")];
    for row in rows {
        let fields: Vec<String> = headers
            .iter()
            .map(|header| row.get(header).unwrap_or(&Value::Null).display())
            .collect();
        lines.push(fields.join(" | "));
    }

    for line in lines {
        if y < 15.0 {
            // Start a new page when the current one is full.
            let (next_page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            current_layer = doc.get_page(next_page).get_layer(next_layer);
            y = 282.0;
        }
        current_layer.use_text(line, 9.0, Mm(10.0), Mm(y), &font);
        y -= 5.0;
    }

    doc.save(&mut BufWriter::new(File::create(path)?))
        .map_err(|err| QueryRunnerError::Pdf(err.to_string()))?;
    Ok(())
}

/// Writes `rows` to `path` in the given format.
///
/// An empty record sequence is a no-op: no file is written and `Ok` is
/// returned immediately.
pub fn export_records(rows: &[Record], format: ExportFormat, path: &Path) -> QueryRunnerResult<()> {
    if rows.is_empty() {
        tracing::debug!("export_records: empty record sequence, nothing to do");
        return Ok(());
    }

    tracing::debug!(
        "export_records: format={format:?} rows={} path={path:?}",
        rows.len()
    );

    match format {
        ExportFormat::Csv => {
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(csv_string(rows).as_bytes())?;
            writer.flush()?;
        }
        ExportFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(json_string(rows)?.as_bytes())?;
            writer.flush()?;
        }
        ExportFormat::Xlsx => write_xlsx(rows, path)?,
        ExportFormat::Pdf => {
            let title = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("data")
                .to_string();
            write_pdf(rows, path, &title)?;
        }
    }

    Ok(())
}

/// Opens a save dialog for the chosen format and writes the rows to the
/// selected destination.
///
/// The write runs on a blocking task so it never stalls the UI thread; the
/// result is reported back over a oneshot channel. If the user types a
/// different known extension in the dialog, that extension wins over the
/// menu choice.
pub async fn export_dialog(
    rows: Vec<Record>,
    format: ExportFormat,
    default_file_name: String,
    ctx: Context,
) -> QueryRunnerResult<()> {
    // Empty-data guard: the export control is disabled in this case, but a
    // direct call must also be a no-op.
    if rows.is_empty() {
        return Ok(());
    }

    let file = AsyncFileDialog::new()
        .add_filter(format.label(), &[format.extension()])
        .set_file_name(&default_file_name)
        .save_file()
        .await;

    // The user cancelled the dialog: not an error.
    let Some(file) = file else {
        return Ok(());
    };

    let path = file.path().to_path_buf();
    let (tx, rx) = oneshot::channel::<QueryRunnerResult<()>>();

    let _handle = tokio::task::spawn_blocking(move || {
        let effective_format = ExportFormat::from_path(&path).unwrap_or(format);
        let result = export_records(&rows, effective_format, &path);

        if tx.send(result).is_err() {
            error!("The receiver has been dropped.");
        }

        ctx.request_repaint();
    });

    rx.await
        .map_err(|err| QueryRunnerError::ChannelReceive(err.to_string()))?
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_export`
#[cfg(test)]
mod tests_export {
    use super::*;
    use crate::Record;
    use time::macros::datetime;

    fn record(pairs: Vec<(&str, Value)>) -> Record {
        Record::from_pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn csv_quotes_every_field() {
        let rows = vec![record(vec![
            ("a", Value::Int(1)),
            ("b", Value::Str("x,y".to_string())),
        ])];

        assert_eq!(csv_string(&rows), "\"a\",\"b\"\n\"1\",\"x,y\"");
    }

    #[test]
    fn csv_escapes_quotes_and_newlines() {
        let rows = vec![record(vec![
            ("note", Value::Str("say \"hi\"\nthere".to_string())),
        ])];

        let csv = csv_string(&rows);
        assert_eq!(csv, "\"note\"\n\"say \"\"hi\"\" there\"");
    }

    #[test]
    fn csv_renders_nulls_and_timestamps() {
        let rows = vec![record(vec![
            ("a", Value::Null),
            ("b", Value::Timestamp(datetime!(2023-01-15 0:00 UTC))),
        ])];

        assert_eq!(
            csv_string(&rows),
            "\"a\",\"b\"\n\"\",\"2023-01-15T00:00:00Z\""
        );
    }

    #[test]
    fn csv_header_uses_first_record_keys() {
        // The second record's extra key is not in the header; its missing
        // key renders as an empty quoted field.
        let rows = vec![
            record(vec![("a", Value::Int(1))]),
            record(vec![("b", Value::Int(2))]),
        ];

        assert_eq!(csv_string(&rows), "\"a\"\n\"1\"\n\"\"");
    }

    #[test]
    fn json_is_pretty_with_two_space_indent() -> QueryRunnerResult<()> {
        let rows = vec![record(vec![
            ("id", Value::Int(1)),
            ("name", Value::Str("Laptop".to_string())),
        ])];

        let json = json_string(&rows)?;
        assert_eq!(json, "[\n  {\n    \"id\": 1,\n    \"name\": \"Laptop\"\n  }\n]");
        Ok(())
    }

    #[test]
    fn empty_rows_export_is_a_noop() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.csv");

        export_records(&[], ExportFormat::Csv, &path)?;
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn csv_file_round_trip() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.csv");
        let rows = vec![record(vec![("a", Value::Int(1))])];

        export_records(&rows, ExportFormat::Csv, &path)?;
        let written = std::fs::read_to_string(&path)?;
        assert_eq!(written, "\"a\"\n\"1\"");
        Ok(())
    }

    #[test]
    fn format_metadata() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(
            ExportFormat::Csv.default_file_name("customers"),
            "customers_query_results.csv"
        );
        assert_eq!(ExportFormat::Pdf.default_file_name("customers"), "data.pdf");
        assert_eq!(
            ExportFormat::from_path(Path::new("out.XLSX")),
            Some(ExportFormat::Xlsx)
        );
        assert_eq!(ExportFormat::from_path(Path::new("out.txt")), None);
    }
}
