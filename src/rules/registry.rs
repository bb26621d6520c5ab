//! Ordered status name <-> code bijection

use ahash::AHashMap;
use serde::Serialize;

use crate::core::error::ConfigError;
use crate::core::types::StatusCode;

/// The finite set of statuses a model recognises
///
/// Codes are handed out sequentially from `base` in registration order.
/// Sentinels such as `Blocked = -1` are registered with an explicit code.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRegistry {
    entries: Vec<(String, StatusCode)>,
    #[serde(skip)]
    by_name: AHashMap<String, StatusCode>,
    #[serde(skip)]
    by_code: AHashMap<StatusCode, usize>,
    next_code: StatusCode,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::with_base(0)
    }
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: StatusCode) -> Self {
        Self {
            entries: Vec::new(),
            by_name: AHashMap::new(),
            by_code: AHashMap::new(),
            next_code: base,
        }
    }

    /// Register a status, returning its code. Already-known names keep theirs.
    pub fn add_status(&mut self, name: &str) -> StatusCode {
        if let Some(&code) = self.by_name.get(name) {
            return code;
        }
        while self.by_code.contains_key(&self.next_code) {
            self.next_code += 1;
        }
        let code = self.next_code;
        self.next_code += 1;
        self.insert(name, code);
        code
    }

    /// Register a status under a caller-chosen code
    ///
    /// Re-registering the same pair is a no-op; any other collision on name
    /// or code is rejected.
    pub fn register_with_code(
        &mut self,
        name: &str,
        code: StatusCode,
    ) -> Result<StatusCode, ConfigError> {
        if let Some(&existing) = self.by_name.get(name) {
            if existing == code {
                return Ok(code);
            }
            return Err(ConfigError::DuplicateStatus {
                name: name.to_string(),
                existing,
            });
        }
        if let Some(&pos) = self.by_code.get(&code) {
            return Err(ConfigError::DuplicateCode {
                code,
                owner: self.entries[pos].0.clone(),
            });
        }
        self.insert(name, code);
        if code >= self.next_code {
            self.next_code = code + 1;
        }
        Ok(code)
    }

    fn insert(&mut self, name: &str, code: StatusCode) {
        self.by_name.insert(name.to_string(), code);
        self.by_code.insert(code, self.entries.len());
        self.entries.push((name.to_string(), code));
    }

    pub fn code(&self, name: &str) -> Option<StatusCode> {
        self.by_name.get(name).copied()
    }

    /// Like `code`, but an unknown name is a configuration error
    pub fn resolve(&self, name: &str) -> Result<StatusCode, ConfigError> {
        self.code(name)
            .ok_or_else(|| ConfigError::UnknownStatus(name.to_string()))
    }

    pub fn name(&self, code: StatusCode) -> Option<&str> {
        self.by_code
            .get(&code)
            .map(|&pos| self.entries[pos].0.as_str())
    }

    pub fn contains_code(&self, code: StatusCode) -> bool {
        self.by_code.contains_key(&code)
    }

    /// `(name, code)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, StatusCode)> + '_ {
        self.entries.iter().map(|(name, code)| (name.as_str(), *code))
    }

    pub fn codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.entries.iter().map(|(_, code)| *code)
    }

    /// First registered non-sentinel status; nodes not named by the
    /// initial configuration start here.
    pub fn default_status(&self) -> Option<StatusCode> {
        self.codes().find(|&code| code >= 0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
