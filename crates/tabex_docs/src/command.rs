use std::fmt;
use std::sync::Arc;

use tabex_core::{DocumentOptions, RecordSet, Result, SpreadsheetOptions};
use tracing::debug;

use crate::{pdf, xlsx};

/// Output format produced by an [`ExportCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Spreadsheet,
    Document,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Spreadsheet => xlsx::EXTENSION,
            Self::Document => pdf::EXTENSION,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One export unit: a record set bound to a renderer and its options.
pub enum ExportCommand {
    Spreadsheet {
        records: Arc<dyn RecordSet>,
        options: SpreadsheetOptions,
    },
    Document {
        records: Arc<dyn RecordSet>,
        options: DocumentOptions,
    },
}

impl ExportCommand {
    pub fn spreadsheet(records: Arc<dyn RecordSet>, options: SpreadsheetOptions) -> Self {
        Self::Spreadsheet { records, options }
    }

    pub fn document(records: Arc<dyn RecordSet>, options: DocumentOptions) -> Self {
        Self::Document { records, options }
    }

    pub fn format(&self) -> ExportFormat {
        match self {
            Self::Spreadsheet { .. } => ExportFormat::Spreadsheet,
            Self::Document { .. } => ExportFormat::Document,
        }
    }

    fn records(&self) -> &dyn RecordSet {
        match self {
            Self::Spreadsheet { records, .. } | Self::Document { records, .. } => records.as_ref(),
        }
    }

    /// Archive entry name: `{TypeName}.{extension}`.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.records().type_name(), self.format().extension())
    }

    /// Projects the bound records and renders them. Every call renders from
    /// scratch.
    pub fn execute(&self) -> Result<Vec<u8>> {
        let projection = self.records().project()?;
        debug!(
            file = %self.filename(),
            rows = projection.row_count(),
            "Executing export command"
        );
        match self {
            Self::Spreadsheet { options, .. } => xlsx::render(&projection, options),
            Self::Document { options, .. } => pdf::render(&projection, options),
        }
    }
}

impl fmt::Debug for ExportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportCommand")
            .field("format", &self.format())
            .field("type_name", &self.records().type_name())
            .field("records", &self.records().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabex_core::{ColumnDescriptor, ExportError, Record, Value};

    struct Crate {
        id: i64,
        label: &'static str,
    }

    impl Record for Crate {
        const TYPE_NAME: &'static str = "Crate";

        fn columns() -> Vec<ColumnDescriptor> {
            vec![ColumnDescriptor::integer("Id"), ColumnDescriptor::text("Label")]
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into(), self.label.into()]
        }
    }

    struct Opaque;

    impl Record for Opaque {
        const TYPE_NAME: &'static str = "Opaque";

        fn columns() -> Vec<ColumnDescriptor> {
            Vec::new()
        }

        fn values(&self) -> Vec<Value> {
            Vec::new()
        }
    }

    fn crates() -> Arc<Vec<Crate>> {
        Arc::new(vec![
            Crate { id: 1, label: "alpha" },
            Crate { id: 2, label: "beta" },
        ])
    }

    #[test]
    fn test_filenames_follow_type_name() {
        let records = crates();
        let sheet = ExportCommand::spreadsheet(records.clone(), SpreadsheetOptions::default());
        let doc = ExportCommand::document(records, DocumentOptions::default());
        assert_eq!(sheet.filename(), "Crate.xlsx");
        assert_eq!(doc.filename(), "Crate.pdf");
        assert_eq!(sheet.format(), ExportFormat::Spreadsheet);
        assert_eq!(doc.format().to_string(), "pdf");
    }

    #[test]
    fn test_execute_produces_format_bytes() {
        let records = crates();
        let sheet = ExportCommand::spreadsheet(records.clone(), SpreadsheetOptions::default());
        let doc = ExportCommand::document(records, DocumentOptions::default());
        assert_eq!(&sheet.execute().unwrap()[0..2], b"PK");
        assert!(doc.execute().unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_document_execute_is_idempotent() {
        let doc = ExportCommand::document(crates(), DocumentOptions::default());
        assert_eq!(doc.execute().unwrap(), doc.execute().unwrap());
    }

    #[test]
    fn test_zero_field_type_fails_both_formats() {
        let records = Arc::new(vec![Opaque]);
        let sheet = ExportCommand::spreadsheet(records.clone(), SpreadsheetOptions::default());
        let doc = ExportCommand::document(records, DocumentOptions::default());
        assert!(matches!(
            sheet.execute(),
            Err(ExportError::TypeIntrospection { .. })
        ));
        assert!(matches!(
            doc.execute(),
            Err(ExportError::TypeIntrospection { .. })
        ));
    }

    #[test]
    fn test_debug_summarises_binding() {
        let doc = ExportCommand::document(crates(), DocumentOptions::default());
        let dbg = format!("{doc:?}");
        assert!(dbg.contains("Document"));
        assert!(dbg.contains("Crate"));
    }
}
