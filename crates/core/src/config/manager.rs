//! Typed configuration sections backed by a JSON value tree.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use super::ConfigError;

/// A typed view on one section of the configuration tree.
///
/// `SECTION` is a dotted path into the tree (`"mail"`, `"services.payment"`).
pub trait ConfigSection: DeserializeOwned + Send + Sync + 'static {
    const SECTION: &'static str;

    /// Checked after deserialization, before the section is cached
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Holds the loaded configuration tree and hands out typed sections.
///
/// Sections are deserialized once per type and shared afterwards.
#[derive(Debug)]
pub struct ConfigManager {
    root: JsonValue,
    sections: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ConfigManager {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::from_value(JsonValue::Object(serde_json::Map::new()))
    }

    /// Create a configuration from an already loaded value tree
    pub fn from_value(root: JsonValue) -> Self {
        Self {
            root,
            sections: RwLock::new(HashMap::new()),
        }
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_json::from_str(source)?))
    }

    /// Parse a YAML document
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_yaml::from_str(source)?))
    }

    /// Deep-merge another tree on top of this one; later values win.
    pub fn merge(mut self, overlay: JsonValue) -> Self {
        merge_values(&mut self.root, overlay);
        self.sections
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self
    }

    /// Look up a raw value by dotted path
    pub fn value(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// Check whether a section exists without deserializing it
    pub fn has(&self, path: &str) -> bool {
        self.value(path).is_some()
    }

    /// Get a typed section, deserializing and validating it on first access
    pub fn get<C: ConfigSection>(&self) -> Result<Arc<C>, ConfigError> {
        let type_id = TypeId::of::<C>();
        if let Some(cached) = self.read_sections().get(&type_id) {
            if let Ok(section) = Arc::clone(cached).downcast::<C>() {
                return Ok(section);
            }
        }

        let raw = self
            .value(C::SECTION)
            .ok_or_else(|| ConfigError::missing_section(C::SECTION))?;
        let section: C = serde_json::from_value(raw.clone())?;
        section.validate()?;

        let section = Arc::new(section);
        self.sections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_insert_with(|| Arc::clone(&section) as Arc<dyn Any + Send + Sync>);
        tracing::debug!(section = C::SECTION, "configuration section loaded");
        Ok(section)
    }

    fn read_sections(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Arc<dyn Any + Send + Sync>>> {
        self.sections.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(base: &mut JsonValue, overlay: JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base), JsonValue::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
