/*
 * Validation and normalization of externally supplied catalog payloads.
 *
 * A payload goes through three steps: JSON parsing (`ImportError::Parse`),
 * shape validation in a fixed order that reports the first violation
 * (`ImportError::Shape`), and legacy-row normalization. Only after all three
 * succeed does the caller swap the result into its store, so a rejected
 * payload never leaves a partially replaced catalog behind.
 *
 * The legacy encoding stems from an old export bug where a whole row was
 * stored as a JSON string in element 1: `["1", "[\"PLC\",\"a\",\"b\"]"]`.
 * Such rows are rewritten to `["PLC", "a", "b"]`. A row that looks legacy but
 * does not decode is kept unchanged. The rewrite only applies to imported
 * files: the autosave slot is written by this application in canonical form
 * and is read back with `parse_saved_snapshot`, which validates only.
 *
 * Versions above `MAX_VERSION` are rejected so that later increments cannot
 * overflow.
 */
use super::models::{CategoryRow, SCHEMA_VERSION, Snapshot};
use super::timestamps;
use serde_json::Value;

// Largest integer a JSON number holds exactly in every reader of the format.
pub const MAX_VERSION: u64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    NotAnObject,
    CategoriesNotArray,
    RowNotArray { row: usize },
    NameNotString { row: usize },
    EmptyName { row: usize },
    VersionOutOfRange,
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeError::NotAnObject => write!(f, "File is not a JSON object."),
            ShapeError::CategoriesNotArray => {
                write!(f, "Missing or invalid 'categories' array.")
            }
            ShapeError::RowNotArray { row } => write!(
                f,
                "Category row {row} must be an array with at least a category name."
            ),
            ShapeError::NameNotString { row } => {
                write!(f, "Category name (index 0) of row {row} must be a string.")
            }
            ShapeError::EmptyName { row } => write!(f, "Category name of row {row} is empty."),
            ShapeError::VersionOutOfRange => {
                write!(f, "Version is larger than {MAX_VERSION}.")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

#[derive(Debug)]
pub enum ImportError {
    Parse(serde_json::Error),
    Shape(ShapeError),
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::Parse(err)
    }
}

impl From<ShapeError> for ImportError {
    fn from(err: ShapeError) -> Self {
        ImportError::Shape(err)
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Parse(e) => write!(f, "Could not parse JSON: {e}"),
            ImportError::Shape(e) => write!(f, "Invalid catalog file: {e}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Parse(e) => Some(e),
            ImportError::Shape(e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

pub fn validate(payload: &Value) -> std::result::Result<(), ShapeError> {
    let object = payload.as_object().ok_or(ShapeError::NotAnObject)?;
    let categories = object
        .get("categories")
        .and_then(Value::as_array)
        .ok_or(ShapeError::CategoriesNotArray)?;
    for (row_index, row) in categories.iter().enumerate() {
        let elements = match row.as_array() {
            Some(elements) if !elements.is_empty() => elements,
            _ => return Err(ShapeError::RowNotArray { row: row_index }),
        };
        let name = elements[0]
            .as_str()
            .ok_or(ShapeError::NameNotString { row: row_index })?;
        if name.trim().is_empty() {
            return Err(ShapeError::EmptyName { row: row_index });
        }
    }
    Ok(())
}

// Strings pass through untouched; everything else becomes its JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode_legacy_field(field: &str) -> Option<CategoryRow> {
    let trimmed = field.trim();
    if !trimmed.starts_with('[') || !trimmed.contains('"') {
        return None;
    }
    let inner: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("Import: Legacy-looking field did not parse ({e}); keeping row.");
            return None;
        }
    };
    let elements = inner.as_array().filter(|a| !a.is_empty())?;
    let name = stringify(&elements[0]);
    if name.trim().is_empty() {
        return None;
    }
    let mut decoded = Vec::with_capacity(elements.len());
    decoded.push(name);
    decoded.extend(elements[1..].iter().map(stringify));
    Some(decoded)
}

/*
 * Converts one validated row to canonical form. If element 1 holds a
 * JSON-encoded row, the decoded row replaces the whole outer row; otherwise
 * the elements are stringified in place.
 */
pub fn normalize_legacy(row: &[Value]) -> CategoryRow {
    if row.len() >= 2
        && let Value::String(field) = &row[1]
        && let Some(decoded) = decode_legacy_field(field)
    {
        log::debug!(
            "Import: Normalized legacy row '{}' into category '{}' with {} item(s).",
            stringify(&row[0]),
            decoded[0],
            decoded.len() - 1
        );
        return decoded;
    }
    stringify_row(row)
}

fn positive_version(value: Option<&Value>) -> std::result::Result<u64, ShapeError> {
    match value.and_then(Value::as_u64) {
        Some(v) if v > MAX_VERSION => Err(ShapeError::VersionOutOfRange),
        Some(v) if v >= 1 => Ok(v),
        _ => Ok(1),
    }
}

// Canonical rows only need their elements turned into strings.
fn stringify_row(row: &[Value]) -> CategoryRow {
    row.iter().map(stringify).collect()
}

/*
 * Validates a parsed payload and builds a snapshot, converting each row with
 * `convert_row`. Missing or unusable `schema`, `version` and `updatedAt`
 * fields take their defaults.
 */
fn build_snapshot(
    payload: &Value,
    convert_row: fn(&[Value]) -> CategoryRow,
) -> std::result::Result<Snapshot, ShapeError> {
    validate(payload)?;
    let version = positive_version(payload.get("version"))?;
    let empty = Vec::new();
    let rows = payload
        .get("categories")
        .and_then(Value::as_array)
        .unwrap_or(&empty);
    let categories: Vec<CategoryRow> = rows
        .iter()
        .filter_map(Value::as_array)
        .map(|row| convert_row(row))
        .collect();
    let schema = payload
        .get("schema")
        .and_then(Value::as_u64)
        .and_then(|s| u32::try_from(s).ok())
        .filter(|s| *s >= 1)
        .unwrap_or(SCHEMA_VERSION);
    let updated_at = payload
        .get("updatedAt")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(timestamps::now_iso);
    Ok(Snapshot {
        schema,
        version,
        updated_at,
        categories,
    })
}

pub fn snapshot_from_value(payload: &Value) -> std::result::Result<Snapshot, ShapeError> {
    build_snapshot(payload, normalize_legacy)
}

// For imported files: validation plus legacy-row normalization.
pub fn parse_snapshot(text: &str) -> Result<Snapshot> {
    let payload: Value = serde_json::from_str(text)?;
    Ok(snapshot_from_value(&payload)?)
}

// For the autosave slot: validation only, item text is taken as stored.
pub fn parse_saved_snapshot(text: &str) -> Result<Snapshot> {
    let payload: Value = serde_json::from_str(text)?;
    Ok(build_snapshot(&payload, stringify_row)?)
}
