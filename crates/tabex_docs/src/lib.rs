// Export renderers (XLSX, PDF), export commands and the archiving invoker

pub mod command;
pub mod invoker;
pub mod pdf;
pub mod xlsx;

pub use command::{ExportCommand, ExportFormat};
pub use invoker::{ExportInvoker, ExportSummary, InvokerState};
