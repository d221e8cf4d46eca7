//! The islands host plugin.
//!
//! Ties the pieces together for one build or dev session: server-side
//! transforms rewrite island exports and feed the registry; in interactive mode
//! the synthesized global bundle is served as a virtual module and referenced
//! from every HTML page; in batch mode [`IslandsPlugin::finalize`] compiles and
//! emits it.

use log::debug;
use rayon::prelude::*;
use regex::Regex;
use std::sync::Arc;

use crate::bundle::synthesize;
use crate::error::Result;
use crate::finalize::{finalize_build, inject_script_tag, FinalizeOutput};
use crate::graph::{collect, collect_entries, EntryIslands, LiveGraphAdapter, LiveModuleGraph, StaticModuleGraph};
use crate::host::{AssetEmitter, Bundler, HostConfig, HostPlugin, TransformContext};
use crate::options::IslandsOptions;
use crate::provider::{DefaultProvider, Provider};
use crate::registry::ImportRegistry;
use crate::transform::{process_exports, ProcessedModule};

pub const PLUGIN_NAME: &str = "islands:transform";

/// Resolved id of the interactive-mode bundle.
pub const GLOBAL_BUNDLE_ID: &str = "\0islands:global-bundle.js";

/// Everything scoped to one build or dev session.
#[derive(Debug)]
pub struct IslandsContext {
    pub options: IslandsOptions,
    pub registry: ImportRegistry,
    pub provider: Arc<dyn Provider>,
    exclude: Vec<Regex>,
}

impl IslandsContext {
    pub fn new(options: IslandsOptions) -> Result<Self> {
        let provider = Arc::new(DefaultProvider::new(&options));
        Self::with_provider(options, provider)
    }

    pub fn with_provider(options: IslandsOptions, provider: Arc<dyn Provider>) -> Result<Self> {
        let exclude = options.exclude_patterns()?;
        Ok(Self {
            options,
            registry: ImportRegistry::new(),
            provider,
            exclude,
        })
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(id))
    }
}

#[derive(Debug, Clone)]
pub struct IslandsPlugin {
    ctx: Arc<IslandsContext>,
    live_graph: Option<Arc<LiveModuleGraph>>,
}

impl IslandsPlugin {
    pub fn new(ctx: Arc<IslandsContext>) -> Self {
        Self {
            ctx,
            live_graph: None,
        }
    }

    /// Interactive mode: walk this graph on every bundle request.
    pub fn with_live_graph(mut self, graph: Arc<LiveModuleGraph>) -> Self {
        self.live_graph = Some(graph);
        self
    }

    pub fn context(&self) -> &IslandsContext {
        &self.ctx
    }

    pub fn should_transform(&self, id: &str, ctx: TransformContext) -> bool {
        ctx.is_server_side
            && !id.starts_with('\0')
            && self.ctx.options.has_transformable_extension(id)
            && !self.ctx.is_excluded(id)
    }

    /// Rewrite one module and register its manifest.
    pub fn transform_module(&self, code: &str, id: &str) -> Result<Option<ProcessedModule>> {
        let wrapper = self.ctx.provider.wrapper();
        let processed = process_exports(code, id, &wrapper.exported_name, Some(wrapper))?;
        if let Some(module) = &processed {
            self.ctx.registry.register(id, &module.manifest);
        }
        Ok(processed)
    }

    /// Transform independent modules in parallel. Results keep input order.
    pub fn transform_batch(
        &self,
        modules: &[(String, String)],
    ) -> Vec<Result<Option<ProcessedModule>>> {
        modules
            .par_iter()
            .map(|(id, code)| {
                if self.should_transform(id, TransformContext::server()) {
                    self.transform_module(code, id)
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    fn live_entries(&self) -> Vec<EntryIslands> {
        match &self.live_graph {
            Some(graph) => collect_entries(&LiveGraphAdapter::new(graph), &self.ctx.registry),
            // Without a graph every registered island belongs to the page.
            None => vec![EntryIslands {
                entry: String::new(),
                modules: self.ctx.registry.module_paths(),
            }],
        }
    }

    /// Interactive mode: the global bundle, recomputed per request.
    pub fn global_bundle_source(&self) -> String {
        let entries = self.live_entries();
        synthesize(
            &entries,
            &self.ctx.registry,
            self.ctx.provider.as_ref(),
            &self.ctx.options.bootstrap,
        )
        .global
    }

    /// Bundle text for a single page of the live graph.
    pub fn page_bundle_source(&self, page_id: &str) -> Option<String> {
        let graph = self.live_graph.as_ref()?;
        let entry = EntryIslands {
            entry: page_id.to_string(),
            modules: collect(page_id, &LiveGraphAdapter::new(graph), &self.ctx.registry),
        };
        let sources = synthesize(
            &[entry],
            &self.ctx.registry,
            self.ctx.provider.as_ref(),
            &self.ctx.options.bootstrap,
        );
        sources.entries.get(page_id).cloned()
    }

    pub fn transform_index_html(&self, html: &str) -> String {
        inject_script_tag(html, &self.ctx.options.public_path)
    }

    /// Batch mode: compile the global bundle and emit it into the primary build.
    pub fn finalize(
        &self,
        graph: &StaticModuleGraph,
        host: &HostConfig,
        bundler: &dyn Bundler,
        emitter: &mut dyn AssetEmitter,
    ) -> Result<FinalizeOutput> {
        finalize_build(&self.ctx, graph, host, bundler, emitter)
    }
}

impl HostPlugin for IslandsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn resolve_id(&self, specifier: &str, _importer: Option<&str>) -> Option<String> {
        (specifier == self.ctx.options.public_path || specifier == GLOBAL_BUNDLE_ID)
            .then(|| GLOBAL_BUNDLE_ID.to_string())
    }

    fn load(&self, id: &str) -> Result<Option<String>> {
        if id != GLOBAL_BUNDLE_ID {
            return Ok(None);
        }
        Ok(Some(self.global_bundle_source()))
    }

    fn transform(&self, code: &str, id: &str, ctx: TransformContext) -> Result<Option<String>> {
        if !self.should_transform(id, ctx) {
            return Ok(None);
        }
        let processed = self.transform_module(code, id)?;
        if processed.is_none() {
            debug!("islands: no islands in {}", id);
        }
        Ok(processed.map(|module| module.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin() -> IslandsPlugin {
        IslandsPlugin::new(Arc::new(
            IslandsContext::new(IslandsOptions::default()).unwrap(),
        ))
    }

    const COUNTER: &str = "export function Counter() { const [n] = useState(0); return <b>{n}</b>; }";

    #[test]
    fn test_client_side_transform_is_passthrough() {
        let plugin = plugin();
        let out = plugin
            .transform(COUNTER, "/src/Counter.jsx", TransformContext::client())
            .unwrap();
        assert!(out.is_none());
        assert!(plugin.context().registry.is_empty());
    }

    #[test]
    fn test_excluded_and_foreign_ids_are_skipped() {
        let plugin = plugin();
        let server = TransformContext::server();
        assert!(!plugin.should_transform("/node_modules/lib/index.js", server));
        assert!(!plugin.should_transform("/src/styles.css", server));
        assert!(!plugin.should_transform("\0virtual:x.js", server));
        assert!(plugin.should_transform("/src/Counter.jsx", server));
    }

    #[test]
    fn test_server_transform_registers_manifest() {
        let plugin = plugin();
        let out = plugin
            .transform(COUNTER, "/src/Counter.jsx", TransformContext::server())
            .unwrap()
            .unwrap();
        assert!(out.starts_with("import { withHydration } from \"islands-compiler/runtime\";"));
        let record = plugin.context().registry.get("/src/Counter.jsx").unwrap();
        assert_eq!(record.imports[0].export_name, "Counter");
    }

    #[test]
    fn test_virtual_bundle_resolves_and_loads() {
        let plugin = plugin();
        plugin
            .transform(COUNTER, "/src/Counter.jsx", TransformContext::server())
            .unwrap();

        let id = plugin.resolve_id("/@islands/global.js", None).unwrap();
        let code = plugin.load(&id).unwrap().unwrap();
        assert!(code.contains("from \"/src/Counter.jsx\""));
        assert!(plugin.load("/src/Counter.jsx").unwrap().is_none());
    }

    #[test]
    fn test_batch_transform_keeps_order() {
        let plugin = plugin();
        let modules = vec![
            ("/src/Counter.jsx".to_string(), COUNTER.to_string()),
            ("/src/Static.jsx".to_string(), "export const S = () => <p />;".to_string()),
            ("/src/broken.jsx".to_string(), "export default function (".to_string()),
        ];
        let results = plugin.transform_batch(&modules);
        assert!(matches!(&results[0], Ok(Some(m)) if m.manifest == vec!["Counter"]));
        assert!(matches!(&results[1], Ok(None)));
        assert!(results[2].is_err());
        assert_eq!(plugin.context().registry.len(), 1);
    }
}
