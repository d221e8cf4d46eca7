//! # Islands Compiler
//!
//! Build-time support for partial hydration. Components that need client-side
//! interactivity ("islands") are detected in server-rendered modules, their
//! exports are wrapped with a hydration marker, and one client bundle that
//! imports and hydrates every island reachable from the application's entries
//! is synthesized and compiled.
//!
//! ## Pipeline
//!
//! 1. **Classify**: an exported component is an island when it renders markup
//!    and either carries a `"use island"` directive, calls a `use*` hook or is a
//!    class with `componentDidMount`.
//! 2. **Rewrite**: island exports become
//!    `wrapper(component, exportedName, componentId, modulePath)`; the wrapper
//!    import is added once.
//! 3. **Register**: each rewritten module's export manifest is turned into an
//!    aliased import statement, keyed by module path.
//! 4. **Walk**: the module graph (live in interactive mode, static in batch
//!    mode) is walked from every entry to find reachable islands.
//! 5. **Synthesize**: imports are deduplicated and handed to a [`Provider`],
//!    which produces the bundle source.
//! 6. **Compile**: batch mode compiles the bundle in an isolated nested build
//!    and re-emits its files into the primary build.
//!
//! The host build tool stays external; [`HostPlugin`], [`Bundler`] and
//! [`AssetEmitter`] are the seams it implements.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod bindings;
mod bundle;
mod classify;
mod error;
mod finalize;
mod graph;
mod host;
mod manifest;
mod nested;
mod options;
mod parse;
mod plugin;
mod provider;
mod registry;
mod transform;

#[cfg(test)]
mod transform_tests;

pub use bundle::{synthesize, BundleSources};
pub use classify::{is_hook_name, is_island, is_markup, ComponentNode, USE_ISLAND_DIRECTIVE};
pub use error::{
    CompilerError, Result, ERR_CONFIG, ERR_EMIT, ERR_IO, ERR_NESTED_BUILD, ERR_PARSE,
};
pub use finalize::{finalize_build, inject_bundle_script, inject_script_tag, FinalizeOutput};
pub use graph::{
    collect, collect_entries, EntryIslands, GraphView, LiveGraphAdapter, LiveModuleGraph,
    ModuleInfo, StaticGraphAdapter, StaticModuleGraph,
};
pub use host::{
    load_with, resolve_with, transform_with, AssetEmitter, Bundler, HostConfig, HostPlugin,
    NestedBuildConfig, OutputChunk, OutputKind, TransformContext,
};
pub use manifest::{HostManifest, ManifestEntry};
pub use nested::{compile_isolated, VirtualModulePlugin};
pub use options::{IslandsOptions, WrapperDescriptor, DEFAULT_RUNTIME_MODULE};
pub use parse::{apply_edits, parse_module, print_program, Edit};
pub use plugin::{IslandsContext, IslandsPlugin, GLOBAL_BUNDLE_ID, PLUGIN_NAME};
pub use provider::{DefaultProvider, Provider};
pub use registry::{derive_alias, module_hash, ImportRecord, ImportRegistry, IslandImport};
pub use transform::{plan_exports, process_exports, ExportManifest, ExportPlan, ProcessedModule};

#[cfg(feature = "napi")]
pub use transform::process_exports_native;

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "Islands Native Bridge Connected".to_string()
}
