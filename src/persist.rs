//! JSON persistence and parameter access for describers and models.
//!
//! A persisted document wraps the serialized value in a small envelope that
//! records which type wrote it:
//!
//! ```json
//! {
//!   "@class": "Standardized<CompositionDescriber>",
//!   "@version": "0.1.0",
//!   "params": { ... }
//! }
//! ```
//!
//! The class is spelled out by each implementation, so documents stay
//! loadable across compiler versions and module moves.

use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, VeidtError};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "@class")]
    class: String,
    #[serde(rename = "@version")]
    version: String,
    params: Value,
}

/// Serialize/deserialize capability shared by describers and models.
pub trait Persist: Serialize + DeserializeOwned {
    /// Stable name of the implementing type.
    const CLASS: &'static str;

    /// Name recorded in the `@class` field of persisted documents. Generic
    /// wrappers override it to include their parameters.
    fn class_name() -> String {
        Self::CLASS.to_string()
    }

    fn to_json(&self) -> Result<String> {
        let envelope = Envelope {
            class: Self::class_name(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            params: serde_json::to_value(self)?,
        };
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    /// Rebuild from a document written by [`Persist::to_json`]. Fails with
    /// [`VeidtError::PersistedKind`] when the document was written by a
    /// different type.
    fn from_json(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let expected = Self::class_name();
        if envelope.class != expected {
            return Err(VeidtError::PersistedKind {
                expected,
                found: envelope.class,
            });
        }
        Ok(serde_json::from_value(envelope.params)?)
    }

    fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!("saved {} to {}", Self::class_name(), path.display());
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let value = Self::from_json(&text)?;
        debug!("loaded {} from {}", Self::class_name(), path.display());
        Ok(value)
    }

    /// Current configuration and fitted state as a JSON object.
    fn get_params(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(VeidtError::InvalidOption {
                estimator: Self::CLASS,
                option: "params".to_string(),
                reason: format!("serializes to {other}, not an object"),
            }),
        }
    }

    /// Overwrite the named parameters.
    ///
    /// Unknown keys are rejected before anything changes. A value of the
    /// wrong type fails deserialization and also leaves `self` untouched.
    fn set_params(&mut self, params: Map<String, Value>) -> Result<()> {
        let mut current = self.get_params()?;
        for (key, value) in params {
            if !current.contains_key(&key) {
                return Err(VeidtError::InvalidOption {
                    estimator: Self::CLASS,
                    option: key,
                    reason: "unknown parameter".to_string(),
                });
            }
            current.insert(key, value);
        }
        *self = serde_json::from_value(Value::Object(current))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cutoff {
        radius: f64,
        max_neighbors: usize,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Other {
        radius: f64,
        max_neighbors: usize,
    }

    impl Persist for Cutoff {
        const CLASS: &'static str = "Cutoff";
    }

    impl Persist for Other {
        const CLASS: &'static str = "Other";
    }

    #[test]
    fn class_is_the_declared_name() {
        assert_eq!(Cutoff::class_name(), "Cutoff");
        let text = Cutoff { radius: 1.0, max_neighbors: 2 }.to_json().unwrap();
        let envelope: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope["@class"], json!("Cutoff"));
        assert_eq!(envelope["@version"], json!(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn json_round_trip() {
        let cutoff = Cutoff { radius: 4.5, max_neighbors: 12 };
        let text = cutoff.to_json().unwrap();
        assert!(text.contains("\"@class\": \"Cutoff\""));
        assert_eq!(Cutoff::from_json(&text).unwrap(), cutoff);
    }

    #[test]
    fn refuses_other_class() {
        let text = Cutoff { radius: 4.5, max_neighbors: 12 }.to_json().unwrap();
        let err = Other::from_json(&text).unwrap_err();
        assert!(matches!(
            err,
            VeidtError::PersistedKind { ref expected, ref found }
                if expected == "Other" && found == "Cutoff"
        ));
    }

    #[test]
    fn set_params_rejects_unknown_keys() {
        let mut cutoff = Cutoff { radius: 4.5, max_neighbors: 12 };
        let mut params = Map::new();
        params.insert("radius".into(), json!(5.0));
        params.insert("sigma".into(), json!(0.1));
        let err = cutoff.set_params(params).unwrap_err();
        assert!(matches!(err, VeidtError::InvalidOption { ref option, .. } if option == "sigma"));
        assert_eq!(cutoff.radius, 4.5);
    }

    #[test]
    fn set_params_updates_known_keys() {
        let mut cutoff = Cutoff { radius: 4.5, max_neighbors: 12 };
        let mut params = Map::new();
        params.insert("radius".into(), json!(6.0));
        cutoff.set_params(params).unwrap();
        assert_eq!(cutoff, Cutoff { radius: 6.0, max_neighbors: 12 });
        assert_eq!(cutoff.get_params().unwrap()["max_neighbors"], json!(12));
    }

    #[test]
    fn set_params_wrong_type_leaves_value() {
        let mut cutoff = Cutoff { radius: 4.5, max_neighbors: 12 };
        let mut params = Map::new();
        params.insert("max_neighbors".into(), json!("many"));
        assert!(matches!(cutoff.set_params(params), Err(VeidtError::Json(_))));
        assert_eq!(cutoff.max_neighbors, 12);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutoff.json");
        let cutoff = Cutoff { radius: 3.0, max_neighbors: 8 };
        cutoff.save(&path).unwrap();
        assert_eq!(Cutoff::load(&path).unwrap(), cutoff);
    }
}
