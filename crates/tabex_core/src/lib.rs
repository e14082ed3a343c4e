pub mod config;
pub mod error;
pub mod logging;
pub mod projection;
pub mod record;

pub use config::{
    DocumentOptions, DocumentStyle, ExportConfig, PdfFont, Rgb, SpreadsheetOptions,
    TruncationPolicy,
};
pub use error::{ErrorCategory, ExportError, Result};
pub use projection::{TabularProjection, project, project_records};
pub use record::{ColumnDescriptor, Record, RecordSet, ScalarType, Value};
