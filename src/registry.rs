//! Per-module import registry.
//!
//! Every module whose rewrite produced a non-empty manifest gets one
//! [`ImportRecord`]: an alias per island export plus the client-side import
//! statement that binds those aliases. Aliases are a pure function of
//! `(module path, export name)`, so re-deriving a record always yields the same
//! text and records from different entries can be deduplicated safely.

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::options::{export_name_text, js_string, sanitize_identifier};

const HASH_LEN: usize = 8;

fn short_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Short stable hash of a module path.
pub fn module_hash(module_path: &str) -> String {
    short_hash(module_path)
}

/// `name + "_" + hash(path)`. Names that had to be sanitized also carry a hash
/// of the raw export name, so `"my-card"` and `my_card` never share an alias.
pub fn derive_alias(module_path: &str, export_name: &str) -> String {
    let base = sanitize_identifier(export_name);
    if base == export_name {
        format!("{}_{}", base, module_hash(module_path))
    } else {
        format!(
            "{}_{}_{}",
            base,
            short_hash(export_name),
            module_hash(module_path)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandImport {
    pub export_name: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub module_path: String,
    pub imports: Vec<IslandImport>,
    pub statement: String,
}

impl ImportRecord {
    pub fn derive(module_path: &str, manifest: &[String]) -> Self {
        let imports: Vec<IslandImport> = manifest
            .iter()
            .map(|name| IslandImport {
                export_name: name.clone(),
                alias: derive_alias(module_path, name),
            })
            .collect();

        let specifiers = imports
            .iter()
            .map(|imp| format!("{} as {}", export_name_text(&imp.export_name), imp.alias))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            module_path: module_path.to_string(),
            statement: format!("import {{ {} }} from {};", specifiers, js_string(module_path)),
            imports,
        }
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|imp| imp.alias.as_str())
    }
}

/// Process-wide (per build or dev session) table of import records, keyed by
/// module path. Writes replace whole records; readers never observe a partially
/// updated record.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    records: RwLock<HashMap<String, Arc<ImportRecord>>>,
}

impl ImportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's manifest. An empty manifest registers nothing.
    /// Re-registering a path overwrites it with an identical record.
    pub fn register(&self, module_path: &str, manifest: &[String]) -> Option<Arc<ImportRecord>> {
        if manifest.is_empty() {
            return None;
        }
        let record = Arc::new(ImportRecord::derive(module_path, manifest));
        debug!(
            "registered {} island export(s) for {}",
            record.imports.len(),
            module_path
        );
        self.records
            .write()
            .insert(module_path.to_string(), Arc::clone(&record));
        Some(record)
    }

    pub fn get(&self, module_path: &str) -> Option<Arc<ImportRecord>> {
        self.records.read().get(module_path).cloned()
    }

    pub fn contains(&self, module_path: &str) -> bool {
        self.records.read().contains_key(module_path)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Registered module paths, sorted for deterministic output.
    pub fn module_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.records.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Drop everything, e.g. when a dev session restarts.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alias_is_deterministic() {
        let a = derive_alias("/src/Card.jsx", "Card");
        let b = derive_alias("/src/Card.jsx", "Card");
        assert_eq!(a, b);
        assert!(a.starts_with("Card_"));
        assert_eq!(a.len(), "Card_".len() + HASH_LEN);
    }

    #[test]
    fn test_alias_differs_per_module() {
        assert_ne!(
            derive_alias("/src/a/Card.jsx", "default"),
            derive_alias("/src/b/Card.jsx", "default")
        );
    }

    #[test]
    fn test_alias_sanitizes_string_export_names() {
        let alias = derive_alias("/src/x.jsx", "my-card");
        assert!(alias.starts_with("my_card_"));
        let alias = derive_alias("/src/x.jsx", "1st");
        assert!(alias.starts_with("_1st_"));
    }

    #[test]
    fn test_sanitized_names_do_not_collide() {
        let quoted = derive_alias("/src/x.jsx", "my-card");
        let plain = derive_alias("/src/x.jsx", "my_card");
        assert_ne!(quoted, plain);
        assert_eq!(plain, format!("my_card_{}", module_hash("/src/x.jsx")));

        let manifest = vec!["my-card".to_string(), "my_card".to_string()];
        let record = ImportRecord::derive("/src/x.jsx", &manifest);
        assert_eq!(
            record.statement,
            format!(
                "import {{ \"my-card\" as {}, my_card as {} }} from \"/src/x.jsx\";",
                quoted, plain
            )
        );
    }

    #[test]
    fn test_record_statement() {
        let manifest = vec!["default".to_string(), "Counter".to_string()];
        let record = ImportRecord::derive("/src/Counter.jsx", &manifest);
        let hash = module_hash("/src/Counter.jsx");
        assert_eq!(
            record.statement,
            format!(
                "import {{ default as default_{0}, Counter as Counter_{0} }} from \"/src/Counter.jsx\";",
                hash
            )
        );
        assert_eq!(
            record.aliases().collect::<Vec<_>>(),
            vec![format!("default_{}", hash), format!("Counter_{}", hash)]
        );
    }

    #[test]
    fn test_register_overwrites_and_ignores_empty() {
        let registry = ImportRegistry::new();
        assert!(registry.register("/src/a.jsx", &[]).is_none());
        assert!(registry.is_empty());

        let first = registry.register("/src/a.jsx", &["A".to_string()]).unwrap();
        let second = registry.register("/src/a.jsx", &["A".to_string()]).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(!registry.contains("/src/a.jsx"));
    }
}
