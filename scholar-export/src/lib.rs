//! Scholar Export - getting reports out of the application
//!
//! - [`DocumentExporter`]: paginated PDF, text or JSON documents
//! - [`summarize`] / [`copy_to_clipboard`]: condensed plain text
//! - [`render`] / [`PrintSnapshot`]: shared HTML markup for view and print
//!
//! Clipboard, file saving and printing are provided by the host through the
//! traits in [`host`].

pub mod exporter;
pub mod host;
pub mod markup;
pub mod paginate;
pub mod pdf;
pub mod summary;

pub use exporter::{sanitize_filename, DocumentExporter, ExportArtifact, ExportFormat};
pub use host::{Clipboard, DirectorySink, FileSink, HostError, PrintHost};
pub use markup::{render, PrintSnapshot};
pub use paginate::{Block, Footer, Page, Paginator, Placement};
pub use summary::{copy_to_clipboard, summarize, SUMMARY_SECTIONS};

use scholar_core::{ErrorContext, ScholarError};

/// Wrap a failed host call as an export error and log it
pub(crate) fn host_failure(message: &str, operation: &str, source: HostError) -> ScholarError {
    let error = ScholarError::Export {
        message: format!("{}: {}", message, source),
        source: Some(source),
        context: ErrorContext::new("scholar_export")
            .with_operation(operation)
            .with_suggestion("Check the host clipboard, file system or printer and try again"),
    };
    error.log();
    error
}
