//! Finalize Module
//!
//! End-of-build step for batch mode: walk the static module graph, synthesize
//! the client bundle, compile it in an isolated build and re-emit its output
//! into the primary build. Also hosts the HTML `<script>` injection shared with
//! interactive mode.

use lazy_static::lazy_static;
use log::info;
use regex::Regex;

use crate::bundle::{synthesize, BundleSources};
use crate::error::{CompilerError, Result, ERR_EMIT};
use crate::graph::{collect_entries, StaticGraphAdapter, StaticModuleGraph};
use crate::host::{AssetEmitter, Bundler, HostConfig};
use crate::manifest::HostManifest;
use crate::nested::compile_isolated;
use crate::options::js_string;
use crate::plugin::IslandsContext;

#[derive(Debug, Clone, Default)]
pub struct FinalizeOutput {
    pub sources: BundleSources,
    pub emitted: Vec<String>,
}

pub fn finalize_build(
    ctx: &IslandsContext,
    graph: &StaticModuleGraph,
    host: &HostConfig,
    bundler: &dyn Bundler,
    emitter: &mut dyn AssetEmitter,
) -> Result<FinalizeOutput> {
    if ctx.registry.is_empty() {
        info!("islands: no islands found, no client bundle emitted");
        return Ok(FinalizeOutput::default());
    }

    let entries = collect_entries(&StaticGraphAdapter::new(graph), &ctx.registry);
    let sources = synthesize(
        &entries,
        &ctx.registry,
        ctx.provider.as_ref(),
        &ctx.options.bootstrap,
    );

    // Per-entry sources are returned to the caller; only the global bundle is compiled.
    let chunks = compile_isolated(
        &ctx.options.bundle_name,
        host,
        &sources.global,
        bundler,
        ctx.options.scratch_dir.as_deref(),
    )?;

    let mut emitted = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        emitter
            .emit_file(&chunk.file_name, &chunk.source)
            .map_err(|e| {
                CompilerError::with_details(
                    ERR_EMIT,
                    &format!("Could not emit `{}`: {}", chunk.file_name, e.message),
                    &chunk.file_name,
                    0,
                    0,
                    Some(e.to_string()),
                )
            })?;
        emitted.push(chunk.file_name.clone());
    }

    info!("islands: emitted {} client file(s)", emitted.len());
    Ok(FinalizeOutput { sources, emitted })
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTML INJECTION
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref HEAD_CLOSE_RE: Regex = Regex::new(r"(?i)</head\s*>").unwrap();
    static ref BODY_CLOSE_RE: Regex = Regex::new(r"(?i)</body\s*>").unwrap();
}

pub fn script_tag(src: &str) -> String {
    format!("<script type=\"module\" src={}></script>", js_string(src))
}

/// Insert a module script before `</head>`, else before `</body>`, else at the
/// end. A page that already carries the tag is returned unchanged.
pub fn inject_script_tag(html: &str, src: &str) -> String {
    let tag = script_tag(src);
    if html.contains(&tag) {
        return html.to_string();
    }

    let at = HEAD_CLOSE_RE
        .find(html)
        .or_else(|| BODY_CLOSE_RE.find(html))
        .map(|m| m.start());

    match at {
        Some(at) => format!("{}{}\n{}", &html[..at], tag, &html[at..]),
        None => format!("{}\n{}", html, tag),
    }
}

/// Batch mode: point the page at the hashed global bundle recorded in the host
/// manifest. Pages are left alone when no bundle was emitted.
pub fn inject_bundle_script(
    html: &str,
    manifest: &HostManifest,
    bundle_name: &str,
    base: &str,
) -> String {
    match manifest.find_asset(bundle_name) {
        Some(file) => {
            let src = format!("{}/{}", base.trim_end_matches('/'), file);
            inject_script_tag(html, &src)
        }
        None => html.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inject_before_head_close() {
        let html = "<html><head><title>x</title></HEAD><body></body></html>";
        let out = inject_script_tag(html, "/@islands/global.js");
        assert_eq!(
            out,
            "<html><head><title>x</title><script type=\"module\" src=\"/@islands/global.js\"></script>\n</HEAD><body></body></html>"
        );
        assert_eq!(inject_script_tag(&out, "/@islands/global.js"), out);
    }

    #[test]
    fn test_inject_falls_back_to_body_then_end() {
        let out = inject_script_tag("<body><p>hi</p></body>", "/a.js");
        assert!(out.ends_with("</script>\n</body>"));
        let out = inject_script_tag("<p>fragment</p>", "/a.js");
        assert!(out.starts_with("<p>fragment</p>\n<script"));
    }

    #[test]
    fn test_inject_bundle_script_uses_manifest() {
        let manifest = HostManifest::from_json(
            r#"{"islands-global.js": {"file": "assets/islands-global-99ff.js"}}"#,
        )
        .unwrap();
        let out = inject_bundle_script("<head></head>", &manifest, "islands-global", "/");
        assert!(out.contains("src=\"/assets/islands-global-99ff.js\""));

        let empty = HostManifest::default();
        assert_eq!(
            inject_bundle_script("<head></head>", &empty, "islands-global", "/"),
            "<head></head>"
        );
    }
}
