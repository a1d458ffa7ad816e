//! Domain models for FinDash
//!
//! Shapes exchanged with the ingestion backend plus the transient upload
//! candidate the validator works on.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single projected balance for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_balance: f64,
}

/// Chronologically ordered forecast points (ascending by date)
pub type ForecastSeries = Vec<ForecastPoint>;

/// Aggregate stats served by the ingestion backend (`GET /stats`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub net_worth: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    /// Net monthly cash flow (negative = spending more than earning)
    pub burn_rate: f64,
    /// Baseline 30-day projection computed by the backend
    #[serde(default)]
    pub forecast: ForecastSeries,
    #[serde(default)]
    pub trend_slope: f64,
}

/// Transaction category as assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A transaction row (`GET /transactions`), display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Transaction {
    /// Category name for display, "Uncategorized" when absent
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Uncategorized")
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

/// Media type assumed for files whose type was not declared
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Metadata of a file the user picked for upload
///
/// Exists only between selection and rejection/submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    pub name: String,
    pub declared_media_type: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    pub fn new(
        name: impl Into<String>,
        declared_media_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            name: name.into(),
            declared_media_type: declared_media_type.into(),
            size_bytes,
        }
    }

    /// Build a candidate from a file on disk
    ///
    /// The declared media type is taken from `declared` when given, otherwise
    /// guessed from the extension the way a browser file picker reports it.
    pub fn from_path(path: &Path, declared: Option<&str>) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::InvalidData(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidData(format!("{} has no file name", path.display())))?;

        let media_type = match declared {
            Some(media_type) => media_type.to_string(),
            None => guess_media_type(&name).to_string(),
        };

        Ok(Self::new(name, media_type, metadata.len()))
    }

    /// Lower-cased substring after the last `.`, `None` when the name has no `.`
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

/// Media type a file picker would report for `name`
pub fn guess_media_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "csv" => "text/csv",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

/// File contents ready for submission to the ingestion backend
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Candidate describing exactly the bytes that would be sent
    pub fn candidate(&self) -> UploadCandidate {
        UploadCandidate::new(
            self.name.clone(),
            self.media_type.clone(),
            self.bytes.len() as u64,
        )
    }
}

/// Ingestion result (`POST /upload`), opaque to FinDash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngestionResult(pub serde_json::Value);
