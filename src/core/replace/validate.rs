//! Post-replacement syntax checks for structured formats.

use std::collections::HashMap;

/// Checks that rewritten content is still well-formed for its format.
pub trait Validator: Send + Sync {
    /// Short format name used in failure messages.
    fn format(&self) -> &str;

    /// `Err` carries a human-readable parse error.
    fn validate(&self, content: &str) -> Result<(), String>;
}

/// JSON object notation, checked with `serde_json`.
pub struct JsonValidator;

impl Validator for JsonValidator {
    fn format(&self) -> &str {
        "JSON"
    }

    fn validate(&self, content: &str) -> Result<(), String> {
        serde_json::from_str::<serde_json::Value>(content)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Validators keyed by file extension (no leading dot).
pub struct ValidatorRegistry {
    by_extension: HashMap<String, Box<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    pub fn register(&mut self, extension: &str, validator: Box<dyn Validator>) {
        self.by_extension
            .insert(extension.trim_start_matches('.').to_string(), validator);
    }

    pub fn get(&self, extension: &str) -> Option<&dyn Validator> {
        self.by_extension
            .get(extension.trim_start_matches('.'))
            .map(|v| v.as_ref())
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("json", Box::new(JsonValidator));
        registry
    }
}
