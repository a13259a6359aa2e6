//! Diagnostic export.
//!
//! Produces the user-visible view of the settings: deprecated fields are
//! omitted and sensitive values are replaced by a placeholder. Persistence
//! never goes through here.

use serde_json::{Map, Value as Json};

use crate::settings::fields::{Fields, FIELDS, REDACTED};

pub fn export(fields: &Fields) -> Json {
    let mut out = Map::new();
    for desc in FIELDS.iter().filter(|d| !d.deprecated) {
        let value = if desc.sensitive {
            Json::from(REDACTED)
        } else {
            desc.value(fields).to_json()
        };
        out.insert(desc.name.to_string(), value);
    }
    Json::Object(out)
}
