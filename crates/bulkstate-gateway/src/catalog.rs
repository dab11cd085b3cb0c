use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;
use bulkstate_core::TargetTransition;
use serde::{Deserialize, Serialize};

/// One selectable option-set value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionEntry {
    pub value: u32,
    pub label: String,
}

impl fmt::Display for OptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.label)
    }
}

/// A status reason and the state it belongs to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusOption {
    pub state: u32,
    pub value: u32,
    pub label: String,
}

/// Read-only view of which transitions an entity supports. Queried per
/// request; nothing is cached between runs.
pub trait TransitionCatalog: Send + Sync {
    /// Entity logical names, sorted.
    fn entities(&self) -> anyhow::Result<Vec<String>>;
    fn state_options(&self, entity: &str) -> anyhow::Result<Vec<OptionEntry>>;
    /// Status reasons valid for `state`.
    fn status_options(&self, entity: &str, state: u32) -> anyhow::Result<Vec<OptionEntry>>;

    fn is_valid(&self, entity: &str, transition: TargetTransition) -> anyhow::Result<bool> {
        let states = self.state_options(entity)?;
        if !states.iter().any(|o| o.value == transition.state) {
            return Ok(false);
        }
        let statuses = self.status_options(entity, transition.state)?;
        Ok(statuses.iter().any(|o| o.value == transition.status))
    }
}

/// Catalog backed by a fixed table, for tests and offline use.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    entities: BTreeMap<String, EntityOptions>,
}

#[derive(Clone, Debug, Default)]
struct EntityOptions {
    states: Vec<OptionEntry>,
    statuses: Vec<StatusOption>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, name: &str, states: Vec<OptionEntry>, statuses: Vec<StatusOption>) -> Self {
        self.entities.insert(name.to_string(), EntityOptions { states, statuses });
        self
    }

    fn entity(&self, name: &str) -> anyhow::Result<&EntityOptions> {
        self.entities.get(name).ok_or_else(|| anyhow!("unknown entity: {}", name))
    }
}

impl TransitionCatalog for StaticCatalog {
    fn entities(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.entities.keys().cloned().collect())
    }

    fn state_options(&self, entity: &str) -> anyhow::Result<Vec<OptionEntry>> {
        Ok(self.entity(entity)?.states.clone())
    }

    fn status_options(&self, entity: &str, state: u32) -> anyhow::Result<Vec<OptionEntry>> {
        Ok(self
            .entity(entity)?
            .statuses
            .iter()
            .filter(|s| s.state == state)
            .map(|s| OptionEntry { value: s.value, label: s.label.clone() })
            .collect())
    }
}
