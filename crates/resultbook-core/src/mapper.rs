//! Authorization records → result lines.
//!
//! Authorization output is produced elsewhere and is loosely typed: unit
//! quantities may be missing or strings, regions may be numbers, the summer
//! flag may be any JSON value. All of that is normalized here, once, before
//! anything reaches the repository.
//!
//! The identifying fields (`startDate`, `childID`, `providerID`, `baseType`)
//! are the exception: a record whose identity cannot be read is rejected
//! by [`parse_records`], naming the record, instead of being guessed at.

use crate::model::{LineDraft, Units, XCode};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One record of authorization output. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    /// `YYYY-MM-DD`, or a timestamp whose date part is used.
    #[serde(rename = "startDate", deserialize_with = "date_prefix")]
    pub start_date: NaiveDate,
    #[serde(rename = "childID", deserialize_with = "integer_id")]
    pub child_id: i64,
    #[serde(rename = "providerID", deserialize_with = "integer_id")]
    pub provider_id: i64,
    #[serde(rename = "baseType")]
    pub base_type: String,
    #[serde(default)]
    pub units: Value,
    /// `None` when the field is absent; an explicit `null` is `Some(Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<Value>,
    #[serde(rename = "xCode", default)]
    pub x_code: Value,
    #[serde(rename = "isSummer", default)]
    pub is_summer: Value,
}

fn date_prefix<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| de::Error::custom(format!("invalid startDate {:?}", raw)))
}

fn integer_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let parsed = match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| de::Error::custom("expected an integer id"))
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// Parses a JSON array of authorization records. Records are decoded one
/// at a time so the error names the first one that does not fit.
pub fn parse_records(raw: &str) -> anyhow::Result<Vec<AuthorizationRecord>> {
    let items: Vec<Value> =
        serde_json::from_str(raw).context("expected a JSON array of authorization records")?;
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item).with_context(|| format!("record {}", idx))
        })
        .collect()
}

/// Maps every record to a line and drops the lines that carry no units.
/// Surviving lines keep their input order.
pub fn build_lines_from_authorization(records: &[AuthorizationRecord]) -> Vec<LineDraft> {
    let lines: Vec<LineDraft> = records
        .iter()
        .map(to_line)
        .filter(|ln| ln.units.has_any())
        .collect();

    tracing::debug!(
        event = "mapper.lines_built",
        input = records.len(),
        kept = lines.len()
    );
    lines
}

pub fn to_line(a: &AuthorizationRecord) -> LineDraft {
    LineDraft {
        start_date: a.start_date,
        child_id: a.child_id,
        provider_id: a.provider_id,
        base_type: a.base_type.clone(),
        units: coerce_units(&a.units),
        region: coerce_region(a.region.as_ref()),
        x_code: coerce_x_code(&a.x_code),
        is_summer: truthy(&a.is_summer),
    }
}

pub fn coerce_units(v: &Value) -> Units {
    let q = |name: &str| v.get(name).map(coerce_quantity).unwrap_or(0.0);
    Units {
        fd: q("fd"),
        pd: q("pd"),
        hd: q("hd"),
        hrs: q("hrs"),
    }
}

/// Numbers and numeric strings pass through; everything else, including
/// negative and non-finite values, becomes 0.
pub fn coerce_quantity(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

/// Region text as authorization output has always been stringified: an
/// absent region reads `undefined`, integral numbers drop their `.0`,
/// arrays join their items with commas.
pub fn coerce_region(v: Option<&Value>) -> String {
    match v {
        None => "undefined".to_string(),
        Some(v) => region_text(v, false),
    }
}

fn region_text(v: &Value, nested: bool) -> String {
    match v {
        Value::Null if nested => String::new(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f == 0.0 => "0".to_string(),
            (None, Some(f)) => f.to_string(),
            (None, None) => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| region_text(item, true))
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

pub fn coerce_x_code(v: &Value) -> XCode {
    let parsed = match v {
        Value::String(s) => XCode::parse(s),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(XCode::Zero),
            Some(9) => Some(XCode::Nine),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        tracing::warn!(event = "mapper.unknown_x_code", value = %v, "defaulting to \"0\"");
        XCode::Zero
    })
}

pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
