//! Ordered transition rules

use ahash::AHashMap;

use crate::compartment::CompartmentRef;
use crate::core::error::ConfigError;
use crate::core::types::StatusCode;
use crate::rules::parameters::Parameters;
use crate::rules::registry::StatusRegistry;

/// A single `from -> to` transition gated by a compartment
#[derive(Debug, Clone)]
pub struct Rule {
    pub from: StatusCode,
    pub to: StatusCode,
    pub compartment: CompartmentRef,
}

/// Rules in registration order
///
/// Order matters: when several rules leave the same status, the earliest
/// registered one that fires wins.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    by_from: AHashMap<StatusCode, Vec<usize>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.by_from
            .entry(rule.from)
            .or_default()
            .push(self.rules.len());
        self.rules.push(rule);
    }

    /// Rules leaving `status`, in registration order
    pub fn rules_from(&self, status: StatusCode) -> impl Iterator<Item = &Rule> + '_ {
        self.by_from
            .get(&status)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rules[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check every rule's endpoints and compartment against the final
    /// registry and parameters
    pub fn validate(
        &self,
        registry: &StatusRegistry,
        params: &Parameters,
    ) -> Result<(), ConfigError> {
        for rule in &self.rules {
            for code in [rule.from, rule.to] {
                if !registry.contains_code(code) {
                    return Err(ConfigError::UnknownStatus(code.to_string()));
                }
            }
            rule.compartment.validate(registry, params)?;
        }
        Ok(())
    }
}
