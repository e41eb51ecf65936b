//! Key-value metadata cache with a freshness stamp.
//!
//! # Design
//! Every `update` replaces the whole map and restamps the cache, even when
//! it is given nothing. An empty cache always reports `needs_update`, so an
//! update without data resets the stamp but still triggers a reload on the
//! next lookup. The cache is not synchronized; its owner serializes access.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::RestError;

pub type Properties = HashMap<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    properties: Properties,
    last_updated_time: Option<Instant>,
    max_age: Option<Duration>,
}

impl PropertyCache {
    /// Non-empty initial properties count as an update.
    pub fn new(properties: Option<Properties>, max_age: Option<Duration>) -> Self {
        let mut cache = Self {
            properties: Properties::new(),
            last_updated_time: None,
            max_age,
        };
        if properties.as_ref().is_some_and(|p| !p.is_empty()) {
            cache.update(properties);
        }
        cache
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn set_max_age(&mut self, max_age: Option<Duration>) {
        self.max_age = max_age;
    }

    pub fn last_updated_time(&self) -> Option<Instant> {
        self.last_updated_time
    }

    /// Replace the whole contents and stamp the current time.
    pub fn update(&mut self, properties: Option<Properties>) {
        self.properties = properties.unwrap_or_default();
        self.last_updated_time = Some(Instant::now());
    }

    /// Update from a decoded JSON body. Anything other than an object
    /// clears the cache.
    pub fn update_from_value(&mut self, value: Option<Value>) {
        let properties = match value {
            Some(Value::Object(map)) => Some(map.into_iter().collect()),
            _ => None,
        };
        self.update(properties);
    }

    pub fn clear(&mut self) {
        self.update(None);
    }

    pub fn expired(&self) -> bool {
        self.expired_at(Instant::now())
    }

    /// Staleness as seen at `now`. False unless both the stamp and a nonzero
    /// max age are set; a zero max age means no expiry.
    pub fn expired_at(&self, now: Instant) -> bool {
        match (self.last_updated_time, self.max_age) {
            (Some(updated), Some(max_age)) if !max_age.is_zero() => {
                now.saturating_duration_since(updated) > max_age
            }
            _ => false,
        }
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update_at(Instant::now())
    }

    pub fn needs_update_at(&self, now: Instant) -> bool {
        self.properties.is_empty() || self.expired_at(now)
    }

    pub fn get<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.properties.get(key).unwrap_or(default)
    }

    /// Indexed access; a missing key is an error.
    pub fn try_get(&self, key: &str) -> Result<&Value, RestError> {
        self.properties
            .get(key)
            .ok_or_else(|| RestError::KeyNotFound(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.properties.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.properties.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.properties.iter()
    }

    pub fn get_all(&self) -> &Properties {
        &self.properties
    }
}
