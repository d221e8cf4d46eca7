//! Module graphs and the island walk.
//!
//! Interactive mode reads a live graph that changes between requests; batch mode
//! reads an immutable snapshot taken after the primary build finished bundling.
//! Both are exposed through [`GraphView`] adapters and share one cycle-guarded
//! walk, [`collect`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::registry::ImportRegistry;

/// "Given a module id, return its out-edges", plus where walks start.
pub trait GraphView {
    fn entry_ids(&self) -> Vec<String>;
    fn out_edges(&self, id: &str) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryIslands {
    pub entry: String,
    pub modules: Vec<String>,
}

/// Registered island modules reachable from `entry`, in depth-first import
/// order. Every module is visited at most once, so cycles terminate.
pub fn collect(entry: &str, graph: &dyn GraphView, registry: &ImportRegistry) -> Vec<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut islands = Vec::new();
    let mut stack = vec![entry.to_string()];

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        if registry.contains(&id) {
            islands.push(id.clone());
        }
        // Reverse so the first import is walked first.
        for dep in graph.out_edges(&id).into_iter().rev() {
            if !visited.contains(&dep) {
                stack.push(dep);
            }
        }
    }

    islands
}

/// Run [`collect`] for every entry of the graph.
pub fn collect_entries(graph: &dyn GraphView, registry: &ImportRegistry) -> Vec<EntryIslands> {
    graph
        .entry_ids()
        .into_iter()
        .map(|entry| {
            let modules = collect(&entry, graph, registry);
            EntryIslands { entry, modules }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIVE GRAPH (interactive mode)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
struct LiveNode {
    imported: Vec<String>,
    importers: HashSet<String>,
}

/// Mutable graph kept up to date by the dev server. Each update replaces a
/// module's whole edge list under one write lock.
#[derive(Debug, Default)]
pub struct LiveModuleGraph {
    nodes: RwLock<HashMap<String, LiveNode>>,
}

impl LiveModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_module(&self, id: &str, imported: Vec<String>) {
        let mut nodes = self.nodes.write();

        let previous = nodes
            .get(id)
            .map(|node| node.imported.clone())
            .unwrap_or_default();
        for dep in &previous {
            if let Some(node) = nodes.get_mut(dep) {
                node.importers.remove(id);
            }
        }
        for dep in &imported {
            nodes
                .entry(dep.clone())
                .or_default()
                .importers
                .insert(id.to_string());
        }
        nodes.entry(id.to_string()).or_default().imported = imported;
    }

    pub fn remove_module(&self, id: &str) {
        let mut nodes = self.nodes.write();
        let Some(removed) = nodes.remove(id) else {
            return;
        };
        for dep in &removed.imported {
            if let Some(node) = nodes.get_mut(dep) {
                node.importers.remove(id);
            }
        }
        for importer in &removed.importers {
            if let Some(node) = nodes.get_mut(importer) {
                node.imported.retain(|dep| dep != id);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.read().contains_key(id)
    }

    pub fn importers(&self, id: &str) -> Vec<String> {
        let mut importers: Vec<String> = self
            .nodes
            .read()
            .get(id)
            .map(|node| node.importers.iter().cloned().collect())
            .unwrap_or_default();
        importers.sort();
        importers
    }
}

pub struct LiveGraphAdapter<'g> {
    graph: &'g LiveModuleGraph,
}

impl<'g> LiveGraphAdapter<'g> {
    pub fn new(graph: &'g LiveModuleGraph) -> Self {
        Self { graph }
    }
}

impl GraphView for LiveGraphAdapter<'_> {
    /// Roots: modules nothing imports.
    fn entry_ids(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .graph
            .nodes
            .read()
            .iter()
            .filter(|(_, node)| node.importers.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        roots.sort();
        roots
    }

    fn out_edges(&self, id: &str) -> Vec<String> {
        self.graph
            .nodes
            .read()
            .get(id)
            .map(|node| node.imported.clone())
            .unwrap_or_default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC GRAPH (batch mode)
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleInfo {
    pub id: String,
    pub is_entry: bool,
    pub imported_ids: Vec<String>,
    pub dynamically_imported_ids: Vec<String>,
}

/// Snapshot of the primary build's module graph.
#[derive(Debug, Clone, Default)]
pub struct StaticModuleGraph {
    modules: Vec<ModuleInfo>,
    index: HashMap<String, usize>,
}

impl StaticModuleGraph {
    pub fn new(modules: Vec<ModuleInfo>) -> Self {
        let index = modules
            .iter()
            .enumerate()
            .map(|(i, info)| (info.id.clone(), i))
            .collect();
        Self { modules, index }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }
}

pub struct StaticGraphAdapter<'g> {
    graph: &'g StaticModuleGraph,
}

impl<'g> StaticGraphAdapter<'g> {
    pub fn new(graph: &'g StaticModuleGraph) -> Self {
        Self { graph }
    }
}

impl GraphView for StaticGraphAdapter<'_> {
    /// Roots: modules the bundler flagged as entry points.
    fn entry_ids(&self) -> Vec<String> {
        self.graph
            .modules
            .iter()
            .filter(|info| info.is_entry)
            .map(|info| info.id.clone())
            .collect()
    }

    fn out_edges(&self, id: &str) -> Vec<String> {
        self.graph
            .get(id)
            .map(|info| {
                info.imported_ids
                    .iter()
                    .chain(&info.dynamically_imported_ids)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
