//! Host build tool integration points.
//!
//! The host (dev server or bundler) is external; these traits are the only
//! surface this crate needs from it.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformContext {
    pub is_server_side: bool,
}

impl TransformContext {
    pub fn server() -> Self {
        Self {
            is_server_side: true,
        }
    }

    pub fn client() -> Self {
        Self {
            is_server_side: false,
        }
    }
}

/// Resolver, loader and transform hooks of a host plugin.
pub trait HostPlugin: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn resolve_id(&self, _specifier: &str, _importer: Option<&str>) -> Option<String> {
        None
    }

    fn load(&self, _id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn transform(&self, _code: &str, _id: &str, _ctx: TransformContext) -> Result<Option<String>> {
        Ok(None)
    }
}

/// First plugin that resolves the specifier wins.
pub fn resolve_with(
    plugins: &[Arc<dyn HostPlugin>],
    specifier: &str,
    importer: Option<&str>,
) -> Option<String> {
    plugins
        .iter()
        .find_map(|plugin| plugin.resolve_id(specifier, importer))
}

/// First plugin that loads the id wins.
pub fn load_with(plugins: &[Arc<dyn HostPlugin>], id: &str) -> Result<Option<String>> {
    for plugin in plugins {
        if let Some(code) = plugin.load(id)? {
            return Ok(Some(code));
        }
    }
    Ok(None)
}

/// Run every plugin's transform hook in order.
pub fn transform_with(
    plugins: &[Arc<dyn HostPlugin>],
    code: String,
    id: &str,
    ctx: TransformContext,
) -> Result<String> {
    let mut code = code;
    for plugin in plugins {
        if let Some(next) = plugin.transform(&code, id, ctx)? {
            code = next;
        }
    }
    Ok(code)
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub root: PathBuf,
    pub out_dir: PathBuf,
    pub plugins: Vec<Arc<dyn HostPlugin>>,
}

/// Configuration handed to the host bundler for an isolated build.
#[derive(Debug, Clone)]
pub struct NestedBuildConfig {
    pub root: PathBuf,
    pub input: String,
    pub out_dir: PathBuf,
    pub plugins: Vec<Arc<dyn HostPlugin>>,
}

/// Runs a complete build and writes its output into `config.out_dir`.
pub trait Bundler: Send + Sync {
    fn build(&self, config: &NestedBuildConfig) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Chunk,
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Path relative to the build's output directory, `/`-separated.
    pub file_name: String,
    pub kind: OutputKind,
    pub source: Vec<u8>,
}

/// Adds files to the primary build's artifact set.
pub trait AssetEmitter {
    fn emit_file(&mut self, file_name: &str, source: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str, Option<&'static str>);

    impl HostPlugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn resolve_id(&self, specifier: &str, _importer: Option<&str>) -> Option<String> {
            self.1.map(|target| format!("{}:{}", target, specifier))
        }

        fn transform(&self, code: &str, _id: &str, _ctx: TransformContext) -> Result<Option<String>> {
            Ok(Some(format!("{}/*{}*/", code, self.0)))
        }
    }

    #[test]
    fn test_first_resolver_wins() {
        let plugins: Vec<Arc<dyn HostPlugin>> = vec![
            Arc::new(Named("a", None)),
            Arc::new(Named("b", Some("B"))),
            Arc::new(Named("c", Some("C"))),
        ];
        assert_eq!(resolve_with(&plugins, "x", None).as_deref(), Some("B:x"));
    }

    #[test]
    fn test_transforms_chain_in_order() {
        let plugins: Vec<Arc<dyn HostPlugin>> =
            vec![Arc::new(Named("a", None)), Arc::new(Named("b", None))];
        let code = transform_with(&plugins, "x".to_string(), "/x.js", TransformContext::client())
            .unwrap();
        assert_eq!(code, "x/*a*//*b*/");
    }
}
