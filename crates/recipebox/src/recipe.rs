//! Core recipe types for recipebox.
//!
//! This module defines the catalog entry and the rules that turn an
//! untrusted JSON payload into a normalized entry.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// Format used for `creation-date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const INVALID_PAYLOAD: &str =
    "Invalid recipe payload. Required: name (string), ingredients (array), instructions (array).";
const EMPTY_NAME: &str = "Invalid recipe payload. name must not be empty.";
const INVALID_DATE: &str = "Invalid creation-date. Expected format YYYY-MM-DD.";

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles"));

/// A single catalog entry.
///
/// Field order here is the order written to disk and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Display name, trimmed and never empty for entries created here.
    pub name: String,

    /// Day the recipe was added, as `YYYY-MM-DD`.
    #[serde(rename = "creation-date", default)]
    pub creation_date: String,

    /// Ingredients in display order.
    #[serde(default)]
    pub ingredients: Vec<String>,

    /// Steps in the order they are performed.
    #[serde(default)]
    pub instructions: Vec<String>,

    /// Free-form notes; may be empty.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Recipe {
    /// Create a recipe dated today (UTC) with no notes.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ingredients: Vec<String>,
        instructions: Vec<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            creation_date: today(),
            ingredients,
            instructions,
            notes: Vec::new(),
        }
    }

    /// Build a recipe from a request payload, defaulting the date to today (UTC).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if required fields are missing or have
    /// the wrong type, if the name is blank, or if `creation-date` is present
    /// but not `YYYY-MM-DD`.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        Self::from_payload_on(payload, Utc::now().date_naive())
    }

    /// Build a recipe from a request payload, using `today` when no date is given.
    ///
    /// # Errors
    ///
    /// See [`Recipe::from_payload`].
    pub fn from_payload_on(payload: &Value, today: NaiveDate) -> Result<Self> {
        let Some(fields) = payload.as_object() else {
            return Err(Error::validation(INVALID_PAYLOAD));
        };

        let (Some(name), Some(ingredients), Some(instructions)) = (
            fields.get("name").and_then(Value::as_str),
            fields.get("ingredients").and_then(Value::as_array),
            fields.get("instructions").and_then(Value::as_array),
        ) else {
            return Err(Error::validation(INVALID_PAYLOAD));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation(EMPTY_NAME));
        }

        let creation_date = match fields.get("creation-date") {
            None => today.format(DATE_FORMAT).to_string(),
            Some(value) => {
                let date = value.as_str().ok_or_else(|| Error::validation(INVALID_DATE))?;
                validate_date(date)?;
                date.to_string()
            }
        };

        let notes = fields
            .get("notes")
            .and_then(Value::as_array)
            .map(|items| coerce_all(items.as_slice()))
            .unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            creation_date,
            ingredients: coerce_all(ingredients),
            instructions: coerce_all(instructions),
            notes,
        })
    }
}

/// Today's UTC date as `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
    Utc::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Check that `date` has the `YYYY-MM-DD` shape.
///
/// Only the shape is checked; `2024-13-45` passes.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the shape does not match.
pub fn validate_date(date: &str) -> Result<()> {
    if DATE_PATTERN.is_match(date) {
        Ok(())
    } else {
        Err(Error::validation(INVALID_DATE))
    }
}

fn coerce_all(items: &[Value]) -> Vec<String> {
    items.iter().map(coerce_to_string).collect()
}

/// Render any JSON value as the string a list element should hold.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => coerce_number(n),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Whole floats below 1e21 lose their fraction, so `1.0` becomes `1`.
#[allow(clippy::float_cmp)]
fn coerce_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
