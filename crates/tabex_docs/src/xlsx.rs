use anyhow::{Context, bail};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tabex_core::{ExportError, Result, ScalarType, SpreadsheetOptions, TabularProjection, Value};
use tracing::debug;

pub const EXTENSION: &str = "xlsx";

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Largest magnitude an f64 holds without losing integer precision.
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// Render a projection as a single-sheet XLSX workbook.
///
/// Row 1 holds the column names in bold; data rows follow in record order.
/// Numeric values stay numeric cells and nulls are left blank. Returns the raw
/// bytes of the xlsx file.
pub fn render(projection: &TabularProjection, options: &SpreadsheetOptions) -> Result<Vec<u8>> {
    build_workbook(projection, options).map_err(|e| ExportError::render(EXTENSION, e))
}

fn build_workbook(
    projection: &TabularProjection,
    options: &SpreadsheetOptions,
) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // A configured name is used verbatim; the derived one is made valid.
    let sheet_name = match &options.sheet_name {
        Some(name) => name.clone(),
        None => default_sheet_name(&projection.type_name),
    };
    let sheet_name = sheet_name.as_str();
    worksheet
        .set_name(sheet_name)
        .with_context(|| format!("Failed to set sheet name: {sheet_name}"))?;

    let header_format = Format::new().set_bold();
    let decimal_format = Format::new().set_num_format("0.00");

    for (col, column) in projection.columns.iter().enumerate() {
        let col = column_index(col)?;
        worksheet
            .write_string_with_format(0, col, &column.name, &header_format)
            .with_context(|| format!("Failed to write header at column {col}"))?;
    }

    for (row_idx, row) in projection.rows.iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1).context("Too many rows for a worksheet")?;
        for (col_idx, (value, column)) in row.iter().zip(&projection.columns).enumerate() {
            let col = column_index(col_idx)?;
            write_cell(worksheet, excel_row, col, value, column.kind, &decimal_format)
                .with_context(|| format!("Failed to write cell at ({excel_row}, {col_idx})"))?;
        }
    }

    if !projection.rows.is_empty() {
        worksheet
            .set_freeze_panes(1, 0)
            .context("Failed to freeze header row")?;
    }

    if options.autofit {
        worksheet.autofit();
    }

    let bytes = workbook
        .save_to_buffer()
        .context("Failed to save workbook to buffer")?;

    debug!(
        sheet = sheet_name,
        rows = projection.row_count(),
        bytes = bytes.len(),
        "Rendered spreadsheet"
    );
    Ok(bytes)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    kind: ScalarType,
    decimal_format: &Format,
) -> anyhow::Result<()> {
    match value {
        Value::Integer(v) if v.unsigned_abs() > MAX_EXACT_INTEGER.unsigned_abs() => {
            // Beyond f64 precision; text keeps every digit.
            worksheet.write_string(row, col, v.to_string())?;
        }
        Value::Integer(v) => {
            worksheet.write_number(row, col, *v as f64)?;
        }
        Value::Decimal(v) if !v.is_finite() => {
            bail!("unsupported non-finite number {v}");
        }
        Value::Decimal(v) if kind == ScalarType::Decimal => {
            worksheet.write_number_with_format(row, col, *v, decimal_format)?;
        }
        Value::Decimal(v) => {
            worksheet.write_number(row, col, *v)?;
        }
        Value::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Value::Null => {}
    }
    Ok(())
}

/// Worksheet name derived from a record type name: characters Excel forbids
/// are replaced and the result is cut to 31 characters.
fn default_sheet_name(type_name: &str) -> String {
    let cleaned: String = type_name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        trimmed.to_string()
    }
}

fn column_index(idx: usize) -> anyhow::Result<u16> {
    u16::try_from(idx).with_context(|| format!("Column {idx} is out of range"))
}
