//! Nested-build orchestrator.
//!
//! Compiles synthesized client code in an isolated build: the host's own
//! plugins minus every islands plugin, a private scratch output directory and
//! the synthesized module registered as the sole entry through a virtual
//! module table. The scratch directory is removed whether the build succeeds
//! or not.

use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::error::{CompilerError, Result, ERR_IO, ERR_NESTED_BUILD};
use crate::host::{Bundler, HostConfig, HostPlugin, NestedBuildConfig, OutputChunk, OutputKind};

/// Every plugin of this subsystem is named with this prefix.
pub const PLUGIN_NAME_PREFIX: &str = "islands:";

/// Prefix of resolved virtual ids. The NUL byte keeps other plugins from
/// treating them as file paths.
pub const VIRTUAL_ID_PREFIX: &str = "\0islands-virtual:";

pub fn is_islands_plugin(name: &str) -> bool {
    name.starts_with(PLUGIN_NAME_PREFIX)
}

pub fn entry_specifier(name: &str) -> String {
    format!("islands-virtual:{}.js", name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL MODULES
// ═══════════════════════════════════════════════════════════════════════════════

/// Explicit specifier → source table served through resolve/load hooks.
#[derive(Debug, Clone, Default)]
pub struct VirtualModulePlugin {
    modules: HashMap<String, String>,
}

impl VirtualModulePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, specifier: &str, source: &str) -> Self {
        self.modules
            .insert(specifier.to_string(), source.to_string());
        self
    }
}

impl HostPlugin for VirtualModulePlugin {
    fn name(&self) -> &str {
        "islands:virtual-modules"
    }

    fn resolve_id(&self, specifier: &str, _importer: Option<&str>) -> Option<String> {
        let key = specifier.strip_prefix(VIRTUAL_ID_PREFIX).unwrap_or(specifier);
        self.modules
            .contains_key(key)
            .then(|| format!("{}{}", VIRTUAL_ID_PREFIX, key))
    }

    fn load(&self, id: &str) -> Result<Option<String>> {
        Ok(id
            .strip_prefix(VIRTUAL_ID_PREFIX)
            .and_then(|key| self.modules.get(key))
            .cloned())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCRATCH DIRECTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Output directory of one nested build, removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh directory, clearing leftovers of an earlier crashed run.
    pub fn create(path: PathBuf) -> Result<Self> {
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|e| CompilerError::io(e, &path))?;
        }
        fs::create_dir_all(&path).map_err(|e| CompilerError::io(e, &path))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(
                    "failed to remove islands scratch dir {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// `<base>/<name>`, where base defaults to `<root>/node_modules/.islands`.
/// Refuses locations that would take primary build output down with them.
pub fn scratch_path(host: &HostConfig, base: Option<&Path>, name: &str) -> Result<PathBuf> {
    let invalid = |message: String, file: &str| CompilerError::build(ERR_IO, &message, file);

    let plain_name = !name.is_empty()
        && matches!(
            Path::new(name).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
    if !plain_name || name.contains(['/', '\\']) {
        return Err(invalid(
            format!("Bundle name `{}` must be a single path segment", name),
            name,
        ));
    }

    let base = base
        .map(Path::to_path_buf)
        .unwrap_or_else(|| host.root.join("node_modules").join(".islands"));
    let path = normalize(&host.root, &base.join(name));
    let out_dir = normalize(&host.root, &host.out_dir);

    if out_dir.starts_with(&path) {
        return Err(invalid(
            format!(
                "Scratch dir {} would contain the build output dir {}",
                path.display(),
                out_dir.display()
            ),
            &path.display().to_string(),
        ));
    }
    Ok(path)
}

/// Absolute form of `path` (relative paths resolve against `root`) with `.`
/// and `..` folded away lexically.
fn normalize(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// ISOLATED BUILD
// ═══════════════════════════════════════════════════════════════════════════════

pub fn compile_isolated(
    name: &str,
    host: &HostConfig,
    source: &str,
    bundler: &dyn Bundler,
    scratch_base: Option<&Path>,
) -> Result<Vec<OutputChunk>> {
    let entry = entry_specifier(name);

    let mut plugins: Vec<Arc<dyn HostPlugin>> =
        vec![Arc::new(VirtualModulePlugin::new().with_module(&entry, source))];
    plugins.extend(
        host.plugins
            .iter()
            .filter(|plugin| !is_islands_plugin(plugin.name()))
            .cloned(),
    );

    let scratch = ScratchDir::create(scratch_path(host, scratch_base, name)?)?;
    let config = NestedBuildConfig {
        root: host.root.clone(),
        input: entry,
        out_dir: scratch.path().to_path_buf(),
        plugins,
    };

    info!(
        "islands: compiling `{}` into {}",
        name,
        scratch.path().display()
    );
    bundler.build(&config).map_err(|e| {
        CompilerError::with_details(
            ERR_NESTED_BUILD,
            &format!("Isolated build `{}` failed: {}", name, e.message),
            &e.file,
            e.line,
            e.column,
            Some(e.to_string()),
        )
    })?;

    let chunks = collect_output(scratch.path())?;
    info!("islands: `{}` produced {} file(s)", name, chunks.len());
    Ok(chunks)
}

/// Read every file under `dir`, sorted by path.
fn collect_output(dir: &Path) -> Result<Vec<OutputChunk>> {
    let mut chunks = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            CompilerError::build(ERR_IO, &e.to_string(), &dir.display().to_string())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let file_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let kind = if file_name.ends_with(".js") || file_name.ends_with(".mjs") {
            OutputKind::Chunk
        } else {
            OutputKind::Asset
        };
        let source = fs::read(path).map_err(|e| CompilerError::io(e, path))?;

        chunks.push(OutputChunk {
            file_name,
            kind,
            source,
        });
    }

    Ok(chunks)
}
