//! Bundle synthesizer.
//!
//! Turns entry → island-module sets into loadable client code through a
//! [`Provider`]. Produces one text per entry plus a `global` text over the
//! deduplicated union of all entries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::graph::EntryIslands;
use crate::provider::Provider;
use crate::registry::ImportRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSources {
    pub entries: BTreeMap<String, String>,
    pub global: String,
}

/// Ordered import lines and alias variables with duplicates dropped.
#[derive(Debug, Default)]
struct ImportSet {
    imports: Vec<String>,
    variables: Vec<String>,
    seen_imports: HashSet<String>,
    seen_variables: HashSet<String>,
}

impl ImportSet {
    fn add_module(&mut self, module_path: &str, registry: &ImportRegistry) {
        let Some(record) = registry.get(module_path) else {
            return;
        };
        if self.seen_imports.insert(record.statement.clone()) {
            self.imports.push(record.statement.clone());
        }
        for alias in record.aliases() {
            if self.seen_variables.insert(alias.to_string()) {
                self.variables.push(alias.to_string());
            }
        }
    }
}

pub fn synthesize(
    entry_islands: &[EntryIslands],
    registry: &ImportRegistry,
    provider: &dyn Provider,
    code: &[String],
) -> BundleSources {
    let mut global = ImportSet::default();
    let mut entries = BTreeMap::new();

    for entry in entry_islands {
        let mut set = ImportSet::default();
        for module in &entry.modules {
            set.add_module(module, registry);
            global.add_module(module, registry);
        }
        entries.insert(
            entry.entry.clone(),
            provider.stringify(&set.imports, &set.variables, code),
        );
    }

    BundleSources {
        entries,
        global: provider.stringify(&global.imports, &global.variables, code),
    }
}
