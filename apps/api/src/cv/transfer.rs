//! JSON import/export of CVs.
//!
//! Export wraps the document in a small versioned envelope. Import accepts that envelope
//! or a bare document, so files saved by the browser's "download JSON" also load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::cv::{CvDocument, CvRow, Template};

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("file is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("export format version {0} is newer than supported version {EXPORT_FORMAT_VERSION}")]
    UnsupportedVersion(u64),

    #[error("CV data does not match the expected shape: {0}")]
    InvalidDocument(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvExport {
    pub version: u32,
    pub title: String,
    pub template: Template,
    pub data: CvDocument,
}

/// Builds the export envelope for a stored CV.
pub fn export_cv(row: &CvRow) -> Result<CvExport, TransferError> {
    let data = CvDocument::from_value(&row.data).map_err(TransferError::InvalidDocument)?;
    Ok(CvExport {
        version: EXPORT_FORMAT_VERSION,
        title: row.title.clone(),
        template: row.template.parse().unwrap_or_default(),
        data,
    })
}

/// Parses an uploaded JSON file into an export envelope.
///
/// Title falls back to the person's name, then to `fallback_title`.
pub fn import_cv(bytes: &[u8], fallback_title: &str) -> Result<CvExport, TransferError> {
    let value: Value = serde_json::from_slice(bytes).map_err(TransferError::Malformed)?;
    let object = value.as_object().ok_or(TransferError::NotAnObject)?;

    let is_envelope = object.contains_key("data") && object.contains_key("version");
    if !is_envelope {
        let data = CvDocument::from_value(&value).map_err(TransferError::InvalidDocument)?;
        let title = default_title(&data, fallback_title);
        return Ok(CvExport {
            version: EXPORT_FORMAT_VERSION,
            title,
            template: Template::default(),
            data,
        });
    }

    let version = object.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version > u64::from(EXPORT_FORMAT_VERSION) {
        return Err(TransferError::UnsupportedVersion(version));
    }

    let data = CvDocument::from_value(&object["data"]).map_err(TransferError::InvalidDocument)?;
    let title = object
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_title(&data, fallback_title));
    let template = object
        .get("template")
        .and_then(Value::as_str)
        .and_then(|t| t.parse().ok())
        .unwrap_or_default();

    Ok(CvExport {
        version: EXPORT_FORMAT_VERSION,
        title,
        template,
        data,
    })
}

/// `cv-<slug>.json`, ASCII only.
pub fn export_file_name(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "cv.json".to_string()
    } else {
        format!("cv-{slug}.json")
    }
}

fn default_title(data: &CvDocument, fallback: &str) -> String {
    let name = data.personal.full_name.trim();
    if name.is_empty() {
        fallback.to_string()
    } else {
        format!("{name} CV")
    }
}
