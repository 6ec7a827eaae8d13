use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::ProfileError;

/// Fields rendered first, in this order, when flattening the profile.
pub const PREFERRED_FIELDS: &[&str] = &[
    "Current Employer",
    "Current Role",
    "Total Experience",
    "Current Annual CTC",
    "Expected Salary (Annual)",
    "Current Location",
    "Preferred Locations",
    "Hometown",
    "Highest Qualification",
    "College/ University",
    "Year of Passing",
    "Skill Set",
    "Notice Period",
    "Reason For Change",
];

/// Flat profile-field-name to value record used to personalise answers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    fields: BTreeMap<String, String>,
}

impl ProfileRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the record from a JSON object file. Missing or empty files yield an empty record.
    pub async fn load(path: &Path) -> Result<Self, ProfileError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "profile file not found; using empty profile");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(&raw)?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, ProfileError> {
        let Value::Object(map) = value else {
            return Err(ProfileError::NotAnObject);
        };
        let fields = map
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(text) => text,
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    _ => return None,
                };
                Some((key, text))
            })
            .collect();
        Ok(Self { fields })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|value| value.trim().is_empty())
    }

    /// `key: value` pairs joined by ` | `; preferred fields first, the rest sorted.
    pub fn summary(&self) -> String {
        let preferred = PREFERRED_FIELDS
            .iter()
            .filter_map(|key| self.fields.get(*key).map(|value| (*key, value)));
        let rest = self
            .fields
            .iter()
            .filter(|(key, _)| !PREFERRED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value));

        preferred
            .chain(rest)
            .filter_map(|(key, value)| {
                let value = value.trim();
                (!value.is_empty()).then(|| format!("{key}: {value}"))
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_orders_preferred_fields_first() {
        let record = ProfileRecord::from_json(json!({
            "Skill Set": "Rust, TypeScript",
            "Current Role": "Backend Engineer",
            "Github": "github.com/someone",
            "Notice Period": " ",
            "Total Experience": 6
        }))
        .unwrap();
        assert_eq!(
            record.summary(),
            "Current Role: Backend Engineer | Total Experience: 6 | Skill Set: Rust, TypeScript | Github: github.com/someone"
        );
    }

    #[test]
    fn rejects_non_object_profiles() {
        assert!(matches!(
            ProfileRecord::from_json(json!(["a"])),
            Err(ProfileError::NotAnObject)
        ));
    }

    #[tokio::test]
    async fn missing_and_empty_files_are_empty_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ProfileRecord::load(&dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(missing.is_empty());

        let empty_path = dir.path().join("empty.json");
        std::fs::write(&empty_path, "").unwrap();
        assert!(ProfileRecord::load(&empty_path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn loads_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_set.json");
        std::fs::write(&path, r#"{"Current Location": "Pune", "Hometown": "Nagpur"}"#).unwrap();
        let record = ProfileRecord::load(&path).await.unwrap();
        assert_eq!(record.get("Hometown"), Some("Nagpur"));
        assert_eq!(record.summary(), "Current Location: Pune | Hometown: Nagpur");
    }
}
