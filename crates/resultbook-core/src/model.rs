use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Metadata row for one saved calculation run.
///
/// Field names on the wire are the camelCase names the stored documents
/// have always used (`resultID`, `applicationID`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMeta {
    #[serde(rename = "resultID")]
    pub result_id: i64,
    #[serde(rename = "applicationID")]
    pub application_id: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "hasSummer", default)]
    pub has_summer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ResultMeta {
    /// Label if present, otherwise the numeric id.
    pub fn display_name(&self) -> String {
        match self.label.as_deref() {
            Some(l) if !l.is_empty() => l.to_string(),
            _ => self.result_id.to_string(),
        }
    }
}

/// Unit quantities carried by a line. Several may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Units {
    /// Full day units
    #[serde(default)]
    pub fd: f64,
    /// Partial day units
    #[serde(default)]
    pub pd: f64,
    /// Half day units
    #[serde(default)]
    pub hd: f64,
    /// Hours (FFN or add-ons)
    #[serde(default)]
    pub hrs: f64,
}

impl Units {
    pub fn new(fd: f64, pd: f64, hd: f64, hrs: f64) -> Self {
        Self { fd, pd, hd, hrs }
    }

    /// A line is only worth keeping when at least one quantity is positive.
    pub fn has_any(&self) -> bool {
        self.fd > 0.0 || self.pd > 0.0 || self.hd > 0.0 || self.hrs > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XCode {
    #[default]
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "9")]
    Nine,
}

impl XCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            XCode::Zero => "0",
            XCode::Nine => "9",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "0" => Some(XCode::Zero),
            "9" => Some(XCode::Nine),
            _ => None,
        }
    }
}

/// A line before it is attached to a result: no ids yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDraft {
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "childID")]
    pub child_id: i64,
    #[serde(rename = "providerID")]
    pub provider_id: i64,
    #[serde(rename = "baseType")]
    pub base_type: String,
    #[serde(default)]
    pub units: Units,
    pub region: String,
    #[serde(rename = "xCode", default)]
    pub x_code: XCode,
    #[serde(rename = "isSummer", default)]
    pub is_summer: bool,
}

/// A stored line. `line_id` is 1-based and only unique within its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultLine {
    #[serde(rename = "lineID")]
    pub line_id: i64,
    #[serde(rename = "resultID")]
    pub result_id: i64,
    #[serde(rename = "applicationID")]
    pub application_id: i64,
    #[serde(flatten)]
    pub detail: LineDraft,
}

/// Input to [`crate::repository::ResultRepository::save_result`].
#[derive(Debug, Clone, Default)]
pub struct SaveResultRequest {
    pub application_id: i64,
    pub lines: Vec<LineDraft>,
    pub set_active: bool,
    pub label: Option<String>,
    pub has_summer: bool,
}

impl SaveResultRequest {
    pub fn new(application_id: i64, lines: Vec<LineDraft>) -> Self {
        Self {
            application_id,
            lines,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_summer(mut self, has_summer: bool) -> Self {
        self.has_summer = has_summer;
        self
    }

    pub fn activate(mut self, set_active: bool) -> Self {
        self.set_active = set_active;
        self
    }
}
