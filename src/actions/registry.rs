//! # Action Registry
//!
//! Composes named action tables into one immutable lookup.
//!
//! ## Composition rules
//!
//! - Base tables must be disjoint. A key claimed by two base tables fails
//!   the build with [`RegistryError::DuplicateAction`].
//! - Override-layer tables are applied after every base table, in
//!   registration order, and replace whatever entry they shadow. Each
//!   replacement is logged and reported by [`ActionRegistry::overridden_actions`].
//! - Table names are unique.
//!
//! ## Usage
//!
//! ```rust
//! use rahat_core::actions::{ActionRegistryBuilder, ActionTable, PayloadShape, PeerCommandAction};
//!
//! let settings = ActionTable::new("settings").action(
//!     "SETTINGS.LIST",
//!     PeerCommandAction::new("PROJECT_SETTINGS_LIST", PayloadShape::SubjectOnly),
//! );
//!
//! let registry = ActionRegistryBuilder::new().register(settings).build().unwrap();
//! assert!(registry.contains("SETTINGS.LIST"));
//! assert!(registry.resolve("SETTINGS.UNKNOWN").is_none());
//! ```

use super::handler::{ActionHandler, HandlerKind};
use crate::orchestration::errors::RegistryError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named set of action handlers
pub struct ActionTable {
    name: String,
    overrides: bool,
    entries: Vec<(String, Arc<dyn ActionHandler>)>,
}

impl ActionTable {
    /// A base table; its keys may not collide with other base tables
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: false,
            entries: Vec::new(),
        }
    }

    /// A table whose keys replace base entries
    pub fn override_layer(name: impl Into<String>) -> Self {
        Self {
            overrides: true,
            ..Self::new(name)
        }
    }

    pub fn action(mut self, action_id: impl Into<String>, handler: impl ActionHandler + 'static) -> Self {
        self.entries.push((action_id.into(), Arc::new(handler)));
        self
    }

    pub fn action_arc(mut self, action_id: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        self.entries.push((action_id.into(), handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_override_layer(&self) -> bool {
        self.overrides
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

/// Collects tables in order and composes them
#[derive(Default)]
pub struct ActionRegistryBuilder {
    tables: Vec<ActionTable>,
}

impl ActionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, table: ActionTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn build(self) -> Result<ActionRegistry, RegistryError> {
        let mut seen_tables = HashSet::new();
        for table in &self.tables {
            if !seen_tables.insert(table.name.clone()) {
                return Err(RegistryError::DuplicateTable {
                    table: table.name.clone(),
                });
            }
        }

        let mut handlers: HashMap<String, Arc<dyn ActionHandler>> = HashMap::new();
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut overridden = Vec::new();
        let table_names = self.tables.iter().map(|t| t.name.clone()).collect();

        let (overrides, bases): (Vec<_>, Vec<_>) =
            self.tables.into_iter().partition(|t| t.overrides);

        for table in bases {
            for (action_id, handler) in table.entries {
                if action_id.trim().is_empty() {
                    return Err(RegistryError::EmptyActionId { table: table.name });
                }
                if let Some(first_table) = owners.get(&action_id) {
                    return Err(RegistryError::DuplicateAction {
                        action_id,
                        first_table: first_table.clone(),
                        second_table: table.name,
                    });
                }
                debug!(action_id = %action_id, table = %table.name, "Registered action");
                owners.insert(action_id.clone(), table.name.clone());
                handlers.insert(action_id, handler);
            }
        }

        for table in overrides {
            for (action_id, handler) in table.entries {
                if action_id.trim().is_empty() {
                    return Err(RegistryError::EmptyActionId { table: table.name });
                }
                if let Some(previous) = owners.insert(action_id.clone(), table.name.clone()) {
                    warn!(
                        action_id = %action_id,
                        replaced_table = %previous,
                        table = %table.name,
                        "Override layer replaces registered action"
                    );
                    overridden.push(action_id.clone());
                }
                handlers.insert(action_id, handler);
            }
        }

        overridden.sort();
        overridden.dedup();

        info!(
            actions = handlers.len(),
            overridden = overridden.len(),
            "Action registry composed"
        );

        Ok(ActionRegistry {
            handlers,
            owners,
            overridden,
            table_names,
        })
    }
}

/// Composed, read-only action lookup
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    owners: HashMap<String, String>,
    overridden: Vec<String>,
    table_names: Vec<String>,
}

impl ActionRegistry {
    pub fn resolve(&self, action_id: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(action_id).cloned()
    }

    pub fn contains(&self, action_id: &str) -> bool {
        self.handlers.contains_key(action_id)
    }

    /// Table that owns an action after composition
    pub fn owner(&self, action_id: &str) -> Option<&str> {
        self.owners.get(action_id).map(String::as_str)
    }

    /// Sorted action identifiers
    pub fn action_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Base actions an override layer replaced
    pub fn overridden_actions(&self) -> &[String] {
        &self.overridden
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut actions_by_table: HashMap<String, usize> = HashMap::new();
        for owner in self.owners.values() {
            *actions_by_table.entry(owner.clone()).or_default() += 1;
        }

        let meta_transaction_actions = self
            .handlers
            .values()
            .filter(|h| h.kind() == HandlerKind::MetaTransaction)
            .count();

        RegistryStats {
            total_actions: self.handlers.len(),
            tables: self.table_names.clone(),
            actions_by_table,
            overridden_actions: self.overridden.len(),
            meta_transaction_actions,
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_actions: usize,
    pub tables: Vec<String>,
    pub actions_by_table: HashMap<String, usize>,
    pub overridden_actions: usize,
    pub meta_transaction_actions: usize,
}
