//! Model exchange files: `{ metadata, layers, edges }` as pretty-printed JSON.

use crate::error::{Error, Result};
use crate::model::Model;
use chrono::{DateTime, TimeZone};
use serde_json::Value;

pub fn export_to_json(model: &Model) -> Result<String> {
    Ok(serde_json::to_string_pretty(model)?)
}

/// Parses an exchange file.
///
/// Malformed JSON is reported as [`Error::Json`]. A document without array-valued `layers`
/// and `edges`, or with entries that do not describe known layers and edges, is an
/// [`Error::InvalidModelFormat`].
pub fn import_from_json(text: &str) -> Result<Model> {
    let value: Value = serde_json::from_str(text)?;
    import_from_value(value)
}

pub fn import_from_value(value: Value) -> Result<Model> {
    let Some(obj) = value.as_object() else {
        return Err(Error::invalid_format("expected a JSON object"));
    };
    for field in ["layers", "edges"] {
        if !obj.get(field).is_some_and(Value::is_array) {
            return Err(Error::invalid_format(format!("missing {field} array")));
        }
    }
    serde_json::from_value(value).map_err(|err| Error::invalid_format(err.to_string()))
}

/// `model_<YYYY-MM-DDTHH-MM-SS>.json` for the given time.
pub fn generate_export_filename<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("model_{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}
