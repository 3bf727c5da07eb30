//! Table export tasks.
//!
//! An export task names a remote result collection, a destination folder, a
//! file format and an optional column list. Starting one is fire-and-forget:
//! the service returns an operation name and nothing is awaited.

use serde::Serialize;
use serde_json::Value;

use crate::expr::FeatureCollection;

/// Output file format of a table export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileFormat {
    #[serde(rename = "CSV")]
    Csv,
}

/// A table export ready to be started.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTask {
    /// Task description, also used as the output file name prefix.
    pub description: String,
    pub collection: FeatureCollection,
    pub format: FileFormat,
    /// Drive folder; `None` writes to the Drive root.
    pub folder: Option<String>,
    /// Columns to export; `None` exports every property.
    pub selectors: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest<'a> {
    expression: Value,
    description: &'a str,
    file_export_options: FileExportOptions<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selectors: Option<&'a [String]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileExportOptions<'a> {
    file_format: FileFormat,
    drive_destination: DriveDestination<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DriveDestination<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<&'a str>,
    filename_prefix: &'a str,
}

impl ExportTask {
    /// Appends `_suffix` to the description (and so the file name).
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        if !suffix.is_empty() {
            self.description = format!("{}_{}", self.description, suffix);
        }
        self
    }

    pub fn with_folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    /// Request body for the table export endpoint.
    pub fn to_request(&self) -> serde_json::Result<Value> {
        let request = ExportRequest {
            expression: self.collection.expr().to_graph(),
            description: &self.description,
            file_export_options: FileExportOptions {
                file_format: self.format,
                drive_destination: DriveDestination {
                    folder: self.folder.as_deref(),
                    filename_prefix: &self.description,
                },
            },
            selectors: self.selectors.as_deref(),
        };
        serde_json::to_value(request)
    }
}
