//! Plugin configuration.

#[cfg(feature = "napi")]
use napi_derive::napi;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CompilerError, Result, ERR_CONFIG};

/// Where the hydration wrapper comes from and how it is imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct WrapperDescriptor {
    pub exported_name: String,
    pub module_path: String,
    pub is_named_export: bool,
}

impl WrapperDescriptor {
    /// The import statement that brings the wrapper into scope.
    pub fn import_statement(&self) -> String {
        let source = js_string(&self.module_path);
        if self.is_named_export {
            format!("import {{ {} }} from {};", self.exported_name, source)
        } else {
            format!("import {} from {};", self.exported_name, source)
        }
    }
}

impl Default for WrapperDescriptor {
    fn default() -> Self {
        Self {
            exported_name: "withHydration".to_string(),
            module_path: DEFAULT_RUNTIME_MODULE.to_string(),
            is_named_export: true,
        }
    }
}

pub const DEFAULT_RUNTIME_MODULE: &str = "islands-compiler/runtime";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IslandsOptions {
    pub wrapper: WrapperDescriptor,
    pub runtime_module: String,
    pub hydrate_export: String,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub public_path: String,
    pub bundle_name: String,
    pub scratch_dir: Option<PathBuf>,
    pub bootstrap: Vec<String>,
}

impl Default for IslandsOptions {
    fn default() -> Self {
        Self {
            wrapper: WrapperDescriptor::default(),
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            hydrate_export: "hydrateIslands".to_string(),
            extensions: [".js", ".jsx", ".ts", ".tsx", ".mjs"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            exclude: vec!["node_modules".to_string()],
            public_path: "/@islands/global.js".to_string(),
            bundle_name: "islands-global".to_string(),
            scratch_dir: None,
            bootstrap: Vec::new(),
        }
    }
}

impl IslandsOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| {
            CompilerError::build(ERR_CONFIG, &format!("Invalid islands options: {}", e), "")
        })?;
        // Surface bad patterns now instead of on the first transform.
        options.exclude_patterns()?;
        Ok(options)
    }

    pub fn exclude_patterns(&self) -> Result<Vec<Regex>> {
        self.exclude
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    CompilerError::build(
                        ERR_CONFIG,
                        &format!("Invalid exclude pattern `{}`: {}", p, e),
                        "",
                    )
                })
            })
            .collect()
    }

    pub fn has_transformable_extension(&self, id: &str) -> bool {
        // Strip vite-style query suffixes (`?v=123`) before looking at the extension.
        let path = id.split('?').next().unwrap_or(id);
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }
}

/// Quote a string as a JS string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

pub(crate) fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Replace characters that cannot appear in an identifier with `_`, prefixing
/// `_` when the result still does not start like one.
pub(crate) fn sanitize_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !is_js_identifier(&ident) {
        ident.insert(0, '_');
    }
    ident
}

/// Export names that are not identifiers (`export { a as "x-y" }`) must stay quoted.
pub(crate) fn export_name_text(name: &str) -> String {
    if is_js_identifier(name) {
        name.to_string()
    } else {
        js_string(name)
    }
}
