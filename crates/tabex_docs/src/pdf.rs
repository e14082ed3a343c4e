//! PDF table generation.
//!
//! Generates minimal but valid PDF 1.4 files using raw PDF format
//! construction. A projection becomes one full-width table, paginated over
//! as many A4 pages as needed, with the header row repeated on every page.
//! Uses the built-in standard fonts, so no font files are embedded.

use tabex_core::{
    DocumentOptions, DocumentStyle, ExportError, PdfFont, Result, Rgb, TabularProjection,
    TruncationPolicy,
};
use tracing::{debug, warn};

pub const EXTENSION: &str = "pdf";

// A4 in points.
const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 36.0;
const CELL_PADDING: f64 = 4.0;
const ELLIPSIS: &str = "...";

/// Render a projection as a PDF document holding a single table.
///
/// At most `options.max_columns` columns are shown; what happens to the rest
/// depends on `options.truncation`. Nulls are drawn as empty cells.
pub fn render(projection: &TabularProjection, options: &DocumentOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let retained = retained_columns(projection, options)?;

    let headers: Vec<&str> = projection.columns[..retained]
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    let rows: Vec<Vec<String>> = projection
        .rows
        .iter()
        .map(|row| row.iter().take(retained).map(ToString::to_string).collect())
        .collect();

    let layout = TableLayout::new(retained, &options.style);
    let pages = layout.paginate(options.title.as_deref(), &headers, &rows);

    let title = options.title.as_deref().unwrap_or(&projection.type_name);
    let bytes = PdfBuilder::new(&options.style).build(title, &pages);

    debug!(
        columns = retained,
        rows = rows.len(),
        pages = pages.len(),
        bytes = bytes.len(),
        "Rendered document"
    );
    Ok(bytes)
}

/// Number of leading columns the table will show.
fn retained_columns(projection: &TabularProjection, options: &DocumentOptions) -> Result<usize> {
    let available = projection.column_count();
    let max = options.max_columns;
    if available <= max {
        return Ok(available);
    }

    match options.truncation {
        TruncationPolicy::Silent => {}
        TruncationPolicy::Warn => {
            let dropped: Vec<&str> = projection.columns[max..]
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            warn!(
                type_name = %projection.type_name,
                max_columns = max,
                "Dropping columns from document: {}",
                dropped.join(", ")
            );
        }
        TruncationPolicy::Reject => {
            return Err(ExportError::ColumnLimitExceeded { available, max });
        }
    }
    Ok(max)
}

// ---------------------------------------------------------------------------
// Table layout
// ---------------------------------------------------------------------------

struct TableLayout<'a> {
    style: &'a DocumentStyle,
    col_width: f64,
    header_height: f64,
    row_height: f64,
}

impl<'a> TableLayout<'a> {
    fn new(columns: usize, style: &'a DocumentStyle) -> Self {
        let usable_width = PAGE_WIDTH - 2.0 * MARGIN;
        Self {
            style,
            col_width: usable_width / columns.max(1) as f64,
            header_height: style.header_font_size + 12.0,
            row_height: style.body_font_size + 8.0,
        }
    }

    /// Lays rows out over pages and returns one content stream per page.
    fn paginate(&self, title: Option<&str>, headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
        let mut pages = Vec::new();
        let mut remaining = rows;

        loop {
            let mut page = PageContent::default();
            let mut y = PAGE_HEIGHT - MARGIN;

            if pages.is_empty() {
                if let Some(title) = title {
                    let size = self.style.header_font_size + 4.0;
                    y -= size;
                    page.text("F3", size, self.style.body_text_color, MARGIN, y, title);
                    y -= 12.0;
                }
            }

            self.draw_header(&mut page, y, headers);
            y -= self.header_height;

            let fit = (((y - MARGIN) / self.row_height).floor() as usize).max(1);
            let take = fit.min(remaining.len());
            for row in &remaining[..take] {
                self.draw_row(&mut page, y, row);
                y -= self.row_height;
            }
            remaining = &remaining[take..];

            pages.push(page.finish());
            if remaining.is_empty() {
                break;
            }
        }
        pages
    }

    fn draw_header(&self, page: &mut PageContent, top: f64, headers: &[&str]) {
        let bottom = top - self.header_height;
        page.fill_rect(
            self.style.header_background,
            MARGIN,
            bottom,
            self.col_width * headers.len() as f64,
            self.header_height,
        );
        for (idx, header) in headers.iter().enumerate() {
            let x = MARGIN + idx as f64 * self.col_width;
            self.draw_cell(
                page,
                x,
                bottom,
                self.header_height,
                "F1",
                self.style.header_font,
                self.style.header_font_size,
                self.style.header_text_color,
                header,
            );
        }
    }

    fn draw_row(&self, page: &mut PageContent, top: f64, row: &[String]) {
        let bottom = top - self.row_height;
        for (idx, cell) in row.iter().enumerate() {
            let x = MARGIN + idx as f64 * self.col_width;
            self.draw_cell(
                page,
                x,
                bottom,
                self.row_height,
                "F2",
                self.style.body_font,
                self.style.body_font_size,
                self.style.body_text_color,
                cell,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &self,
        page: &mut PageContent,
        x: f64,
        bottom: f64,
        height: f64,
        font_ref: &str,
        font: PdfFont,
        size: f64,
        color: Rgb,
        text: &str,
    ) {
        page.stroke_rect(self.style.border_color, x, bottom, self.col_width, height);

        let text = fit_text(text, font, size, self.col_width - 2.0 * CELL_PADDING);
        let text_x = x + (self.col_width - text_width(&text, font, size)) / 2.0;
        // Cap height is roughly 0.7em.
        let baseline = bottom + (height - size * 0.7) / 2.0;
        page.text(font_ref, size, color, text_x, baseline, &text);
    }
}

/// Estimated advance width of `text`, using an average glyph width.
fn text_width(text: &str, font: PdfFont, size: f64) -> f64 {
    text.chars().count() as f64 * size * font.average_width()
}

/// Shortens `text` with an ellipsis until it fits `max_width`.
fn fit_text(text: &str, font: PdfFont, size: f64, max_width: f64) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let glyph = size * font.average_width();
    let capacity = (max_width / glyph).floor() as usize;
    if capacity <= ELLIPSIS.len() {
        // No room for an ellipsis; keep whatever glyphs fit.
        return text.chars().take(capacity).collect();
    }
    let mut shortened: String = text.chars().take(capacity - ELLIPSIS.len()).collect();
    shortened.push_str(ELLIPSIS);
    shortened
}

#[derive(Default)]
struct PageContent {
    ops: String,
}

impl PageContent {
    fn fill_rect(&mut self, color: Rgb, x: f64, y: f64, w: f64, h: f64) {
        let (r, g, b) = color.to_unit();
        self.ops.push_str(&format!("{r:.3} {g:.3} {b:.3} rg\n"));
        self.ops
            .push_str(&format!("{x:.2} {y:.2} {w:.2} {h:.2} re f\n"));
    }

    fn stroke_rect(&mut self, color: Rgb, x: f64, y: f64, w: f64, h: f64) {
        let (r, g, b) = color.to_unit();
        self.ops.push_str(&format!("{r:.3} {g:.3} {b:.3} RG\n"));
        self.ops.push_str("0.5 w\n");
        self.ops
            .push_str(&format!("{x:.2} {y:.2} {w:.2} {h:.2} re S\n"));
    }

    fn text(&mut self, font_ref: &str, size: f64, color: Rgb, x: f64, y: f64, text: &str) {
        let (r, g, b) = color.to_unit();
        self.ops.push_str("BT\n");
        self.ops.push_str(&format!("/{font_ref} {size:.1} Tf\n"));
        self.ops.push_str(&format!("{r:.3} {g:.3} {b:.3} rg\n"));
        self.ops.push_str(&format!("{x:.2} {y:.2} Td\n"));
        self.ops.push_str(&format!("({}) Tj\n", pdf_escape(text)));
        self.ops.push_str("ET\n");
    }

    fn finish(self) -> String {
        self.ops
    }
}

/// Escape text for a PDF string literal.
///
/// The fonts use WinAnsiEncoding, so Latin-1 letters are written as octal
/// escapes and anything outside Latin-1 becomes `?`.
fn pdf_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' | '\r' | '\t' => out.push(' '),
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Reads back the strings drawn with `Tj` by documents from this module, in
/// drawing order.
#[doc(hidden)]
pub fn text_runs(pdf: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(pdf);
    text.lines()
        .filter_map(|line| line.strip_suffix(") Tj")?.strip_prefix('('))
        .map(pdf_unescape)
        .collect()
}

fn pdf_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(d) if d.is_digit(8) => {
                let mut code = 0u32;
                for _ in 0..3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(v) => {
                            code = code * 8 + v;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(code));
            }
            Some(_) => out.extend(chars.next()),
            None => {}
        }
    }
    out
}

// ---------------------------------------------------------------------------
// File assembly
// ---------------------------------------------------------------------------

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const INFO_ID: usize = 3;

/// Minimal PDF file builder. Constructs valid PDF 1.4 files.
struct PdfBuilder<'a> {
    style: &'a DocumentStyle,
    objects: Vec<String>,
}

impl<'a> PdfBuilder<'a> {
    fn new(style: &'a DocumentStyle) -> Self {
        Self {
            style,
            objects: Vec::new(),
        }
    }

    /// Adds an object and returns its object number.
    fn add(&mut self, body: String) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: String) {
        self.objects[id - 1] = body;
    }

    fn font(base: PdfFont) -> String {
        format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            base.base_font()
        )
    }

    /// Build the complete PDF file as bytes.
    fn build(mut self, title: &str, pages: &[String]) -> Vec<u8> {
        // Catalog, page tree and info are filled once page ids are known.
        for _ in 0..INFO_ID {
            self.add(String::new());
        }
        let header_font = self.add(Self::font(self.style.header_font));
        let body_font = self.add(Self::font(self.style.body_font));

        let mut kids = Vec::with_capacity(pages.len());
        for content in pages {
            let content_id = self.add(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ));
            let page_id = self.add(format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Contents {content_id} 0 R /Resources << /Font << \
                 /F1 {header_font} 0 R /F2 {body_font} 0 R /F3 {header_font} 0 R >> >> >>"
            ));
            kids.push(format!("{page_id} 0 R"));
        }

        self.set(
            CATALOG_ID,
            format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"),
        );
        self.set(
            PAGES_ID,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                kids.len()
            ),
        );
        self.set(
            INFO_ID,
            format!(
                "<< /Title ({}) /Producer (tabex) >>",
                pdf_escape(title)
            ),
        );

        let mut pdf = String::new();
        let mut offsets: Vec<usize> = Vec::with_capacity(self.objects.len());

        // Header
        pdf.push_str("%PDF-1.4\n");

        for (idx, body) in self.objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", idx + 1));
        }

        // Cross-reference table
        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1; // +1 for free entry
        pdf.push_str(&format!("xref\n0 {num_objects}\n"));
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }

        // Trailer
        pdf.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root {CATALOG_ID} 0 R /Info {INFO_ID} 0 R >>\n"
        ));
        pdf.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));

        pdf.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabex_core::{ColumnDescriptor, Value};

    fn projection(columns: usize, rows: usize) -> TabularProjection {
        TabularProjection {
            type_name: "Wide".into(),
            columns: (0..columns)
                .map(|c| ColumnDescriptor::text(format!("C{c}")))
                .collect(),
            rows: (0..rows)
                .map(|r| (0..columns).map(|c| Value::from(format!("r{r}c{c}"))).collect())
                .collect(),
        }
    }

    fn page_count(bytes: &[u8]) -> usize {
        String::from_utf8_lossy(bytes).matches("/Type /Page ").count()
    }

    #[test]
    fn test_render_basic() {
        let bytes = render(&projection(3, 2), &DocumentOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let runs = text_runs(&bytes);
        assert_eq!(runs[..3], ["C0", "C1", "C2"]);
        assert_eq!(runs[3..6], ["r0c0", "r0c1", "r0c2"]);
        assert_eq!(runs.len(), 9);
    }

    #[test]
    fn test_empty_rows_still_draw_header() {
        let bytes = render(&projection(2, 0), &DocumentOptions::default()).unwrap();
        assert_eq!(text_runs(&bytes), vec!["C0", "C1"]);
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_columns_beyond_limit_are_dropped() {
        let bytes = render(&projection(6, 1), &DocumentOptions::default()).unwrap();
        let runs = text_runs(&bytes);
        assert_eq!(runs, vec!["C0", "C1", "C2", "C3", "r0c0", "r0c1", "r0c2", "r0c3"]);
    }

    #[test]
    fn test_silent_truncation_matches_warn_output() {
        let silent = DocumentOptions::default().with_truncation(TruncationPolicy::Silent);
        let warn = DocumentOptions::default();
        let p = projection(5, 3);
        assert_eq!(render(&p, &silent).unwrap(), render(&p, &warn).unwrap());
    }

    #[test]
    fn test_reject_truncation_fails() {
        let options = DocumentOptions::default().with_truncation(TruncationPolicy::Reject);
        let err = render(&projection(5, 1), &options).unwrap_err();
        assert!(matches!(
            err,
            ExportError::ColumnLimitExceeded {
                available: 5,
                max: 4
            }
        ));
    }

    #[test]
    fn test_custom_max_columns() {
        let options = DocumentOptions::default().with_max_columns(2);
        let bytes = render(&projection(3, 1), &options).unwrap();
        assert_eq!(text_runs(&bytes), vec!["C0", "C1", "r0c0", "r0c1"]);
    }

    #[test]
    fn test_zero_max_columns_is_config_error() {
        let options = DocumentOptions::default().with_max_columns(0);
        let err = render(&projection(1, 1), &options).unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_nulls_render_as_empty_string() {
        let p = TabularProjection {
            type_name: "Sparse".into(),
            columns: vec![ColumnDescriptor::integer("A"), ColumnDescriptor::text("B")],
            rows: vec![vec![Value::Integer(1), Value::Null]],
        };
        let bytes = render(&p, &DocumentOptions::default()).unwrap();
        assert_eq!(text_runs(&bytes), vec!["A", "B", "1", ""]);
        assert!(!String::from_utf8_lossy(&bytes).contains("null"));
    }

    #[test]
    fn test_header_styled_apart_from_rows() {
        let bytes = render(&projection(2, 1), &DocumentOptions::default()).unwrap();
        let content = String::from_utf8_lossy(&bytes);
        assert!(content.contains("/BaseFont /Times-BoldItalic"));
        assert!(content.contains("/BaseFont /Times-Roman"));
        // Pink header background fill.
        assert!(content.contains("1.000 0.686 0.686 rg"));
        assert!(content.contains("/F1 14.0 Tf"));
        assert!(content.contains("/F2 10.0 Tf"));
    }

    #[test]
    fn test_long_tables_paginate_with_repeated_header() {
        let bytes = render(&projection(2, 100), &DocumentOptions::default()).unwrap();
        assert!(page_count(&bytes) > 1);
        let runs = text_runs(&bytes);
        let header_repeats = runs.iter().filter(|r| r.as_str() == "C0").count();
        assert_eq!(header_repeats, page_count(&bytes));
        // Every data cell is still present, in order.
        let data: Vec<&String> = runs.iter().filter(|r| r.starts_with('r')).collect();
        assert_eq!(data.len(), 200);
        assert_eq!(data[0], "r0c0");
        assert_eq!(data[199], "r99c1");
    }

    #[test]
    fn test_title_is_drawn_first() {
        let options = DocumentOptions {
            title: Some("Inventory (Q3)".into()),
            ..DocumentOptions::default()
        };
        let bytes = render(&projection(1, 1), &options).unwrap();
        assert_eq!(text_runs(&bytes)[0], "Inventory (Q3)");
        assert!(String::from_utf8_lossy(&bytes).contains("/Title (Inventory \\(Q3\\))"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let p = projection(4, 30);
        let options = DocumentOptions::default();
        assert_eq!(render(&p, &options).unwrap(), render(&p, &options).unwrap());
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = render(&projection(2, 3), &DocumentOptions::default()).unwrap();
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let xref_start = content.find("xref\n").unwrap();
        let entries: Vec<usize> = content[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert!(!entries.is_empty());
        for (idx, offset) in entries.iter().enumerate() {
            assert!(content[*offset..].starts_with(&format!("{} 0 obj", idx + 1)));
        }
    }

    #[test]
    fn test_long_text_is_shortened() {
        let long = "x".repeat(500);
        let fitted = fit_text(&long, PdfFont::TimesRoman, 10.0, 100.0);
        assert!(fitted.ends_with(ELLIPSIS));
        assert!(text_width(&fitted, PdfFont::TimesRoman, 10.0) <= 100.0);
        assert_eq!(fit_text("short", PdfFont::TimesRoman, 10.0, 100.0), "short");
    }

    #[test]
    fn test_narrow_cells_never_overflow() {
        for max_width in [-3.0, 0.0, 4.0, 12.0, 15.0, 16.0] {
            let fitted = fit_text("Product 12345", PdfFont::TimesRoman, 10.0, max_width);
            assert!(
                text_width(&fitted, PdfFont::TimesRoman, 10.0) <= max_width.max(0.0),
                "{fitted:?} overflows {max_width}"
            );
        }
        assert_eq!(fit_text("Product", PdfFont::TimesRoman, 10.0, 12.0), "Pr");
    }

    #[test]
    fn test_many_columns_stay_inside_cells() {
        let options = DocumentOptions::default().with_max_columns(60);
        let bytes = render(&projection(60, 1), &options).unwrap();
        let runs = text_runs(&bytes);
        assert_eq!(runs.len(), 120);
        // Cells are about 8.7pt wide, narrower than a glyph plus padding.
        assert!(runs[60..].iter().all(|r| r.chars().count() <= 1));
    }

    #[test]
    fn test_pdf_escape() {
        assert_eq!(pdf_escape("hello"), "hello");
        assert_eq!(pdf_escape("(test)"), "\\(test\\)");
        assert_eq!(pdf_escape("a\\b"), "a\\\\b");
        assert_eq!(pdf_escape("café"), "caf\\351");
        assert_eq!(pdf_escape("日本"), "??");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        for s in ["plain", "(paren)", "back\\slash", "naïve"] {
            assert_eq!(pdf_unescape(&pdf_escape(s)), s);
        }
    }
}
