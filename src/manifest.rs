//! Reader for the host build's file manifest (logical path → hashed output).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CompilerError, Result, ERR_IO};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestEntry {
    pub file: String,
    pub name: Option<String>,
    pub src: Option<String>,
    pub is_entry: bool,
    pub css: Vec<String>,
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostManifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl HostManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            CompilerError::build(ERR_IO, &format!("Invalid build manifest: {}", e), "")
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| CompilerError::io(e, path))?;
        Self::from_json(&json).map_err(|mut e| {
            e.file = path.display().to_string();
            e
        })
    }

    /// Output file of an asset emitted under a well-known logical name.
    /// Tries the manifest key, then the recorded chunk name, then a hashed
    /// file name such as `assets/<name>-3f2a9c.js`.
    pub fn find_asset(&self, logical_name: &str) -> Option<&str> {
        if let Some(entry) = self.entries.get(logical_name) {
            return Some(&entry.file);
        }
        if let Some(entry) = self
            .entries
            .values()
            .find(|entry| entry.name.as_deref() == Some(logical_name))
        {
            return Some(&entry.file);
        }
        self.entries
            .values()
            .map(|entry| entry.file.as_str())
            .find(|file| {
                let base = file.rsplit('/').next().unwrap_or(file);
                base.strip_prefix(logical_name)
                    .is_some_and(|rest| rest.starts_with('-') || rest.starts_with('.'))
            })
    }
}
