//! Recipe API handlers.
//!
//! # Endpoints
//!
//! - `GET /api/recipes` - The catalog as a JSON array
//! - `POST /api/recipes` - Validate and append a recipe (201)
//! - `DELETE /api/recipes` - Remove recipes by position (200)
//!
//! Bodies are parsed as JSON whatever their `Content-Type`.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::error::{Error, Result};
use crate::recipe::Recipe;
use crate::store::{RecipeStore, RemovalSummary};

const SAVE_FAILED: &str = "Server error saving recipe.";
const REMOVE_FAILED: &str = "Server error removing recipes.";
const INVALID_INDICES: &str = "Invalid payload: provide \"indices\" array of integers.";

/// `GET /api/recipes`
pub async fn list_recipes(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    let recipes = with_store(&state, RecipeStore::load).await?;
    Ok(Json(recipes))
}

/// `POST /api/recipes`
///
/// Returns 201 with the entry as stored.
pub async fn create_recipe(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let payload = parse_body(&body)?;
    let recipe = Recipe::from_payload(&payload)?;

    let stored = with_store(&state, move |store| store.append(recipe))
        .await?
        .map_err(|e| ApiError::storage(SAVE_FAILED, &e))?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// `DELETE /api/recipes`
///
/// Returns 200 with `{"removed": n, "remaining": m}`.
pub async fn delete_recipes(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<RemovalSummary>> {
    let payload = parse_body(&body)?;
    let indices = indices_from_payload(&payload)?;

    let summary = with_store(&state, move |store| store.remove_by_indices(&indices))
        .await?
        .map_err(|e| ApiError::storage(REMOVE_FAILED, &e))?;

    Ok(Json(summary))
}

/// Run a store operation on the blocking pool.
async fn with_store<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&RecipeStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| Error::internal(format!("store task failed: {e}")).into())
}

/// Parse a request body; an empty body reads as `null`.
fn parse_body(body: &[u8]) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

/// Extract the positions to remove from a removal payload.
///
/// Numbers and numeric strings with no fractional part are kept, so `2`,
/// `2.0`, `"2"` and `"2e0"` all name position 2. Integral values beyond
/// the `i64` range saturate and match nothing. Anything else in the array
/// is dropped.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `indices` is missing, is not an array,
/// or holds no integers.
pub fn indices_from_payload(payload: &Value) -> Result<BTreeSet<i64>> {
    let Some(items) = payload.get("indices").and_then(Value::as_array) else {
        return Err(Error::validation(INVALID_INDICES));
    };

    let indices: BTreeSet<i64> = items.iter().filter_map(as_index).collect();
    if indices.is_empty() {
        return Err(Error::validation(INVALID_INDICES));
    }
    Ok(indices)
}

fn as_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| s.parse().ok().and_then(integral))
        }
        _ => None,
    }
}

/// Whole finite floats as `i64`, saturating at the ends of the range.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(values: &[i64]) -> BTreeSet<i64> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_indices_from_payload() {
        let indices = indices_from_payload(&json!({"indices": [2, 0, 2]})).unwrap();
        assert_eq!(indices, set(&[0, 2]));
    }

    #[test]
    fn test_indices_drop_non_integers() {
        let payload = json!({"indices": [1, 1.5, "3", "x", null, true, 4.0, -2]});
        let indices = indices_from_payload(&payload).unwrap();
        assert_eq!(indices, set(&[-2, 1, 3, 4]));
    }

    #[test]
    fn test_indices_accept_numeric_strings() {
        let payload = json!({"indices": ["1.0", "1e2", " 7 ", "2.5", "", "NaN", "inf"]});
        let indices = indices_from_payload(&payload).unwrap();
        assert_eq!(indices, set(&[1, 7, 100]));
    }

    #[test]
    fn test_indices_huge_values_saturate() {
        let payload: Value = serde_json::from_str(r#"{"indices": [1e30, -1e30]}"#).unwrap();
        let indices = indices_from_payload(&payload).unwrap();
        assert_eq!(indices, set(&[i64::MIN, i64::MAX]));
    }

    #[test]
    fn test_indices_rejected() {
        let cases = [
            json!({}),
            json!({"indices": 3}),
            json!({"indices": []}),
            json!({"indices": ["a", 0.5]}),
            json!([0, 1]),
            Value::Null,
        ];
        for payload in &cases {
            let err = indices_from_payload(payload).unwrap_err();
            assert_eq!(err.to_string(), INVALID_INDICES, "accepted {payload}");
        }
    }

    #[test]
    fn test_parse_body_empty_is_null() {
        assert_eq!(parse_body(b"").unwrap(), Value::Null);
        assert_eq!(parse_body(b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_body_malformed() {
        let err = parse_body(b"{name:").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m.starts_with("Invalid JSON body")));
    }
}
