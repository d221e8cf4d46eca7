//! Compiler errors surfaced to the host build.
//!
//! Every failure that is not an idempotent no-op ends up here, carrying a
//! stable code, the module it belongs to and (where known) a 1-based location.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_PARSE: &str = "ISL-PARSE";
pub const ERR_NESTED_BUILD: &str = "ISL-NESTED-BUILD";
pub const ERR_EMIT: &str = "ISL-EMIT";
pub const ERR_IO: &str = "ISL-IO";
pub const ERR_CONFIG: &str = "ISL-CONFIG";

fn get_hint(code: &str) -> Option<&'static str> {
    match code {
        ERR_PARSE => Some("Fix the syntax error; island extraction needs a parseable module."),
        ERR_NESTED_BUILD => {
            Some("The isolated client build failed. Check that every island module resolves.")
        }
        ERR_EMIT => Some("The host rejected the client bundle asset."),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message} ({file}:{line}:{column})")]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str, line: u32, column: u32) -> Self {
        Self::with_details(code, message, file, line, column, None)
    }

    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        line: u32,
        column: u32,
        context: Option<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            message: message.to_string(),
            file: file.to_string(),
            line,
            column,
            context,
            hints: get_hint(code).map(|h| vec![h.to_string()]).unwrap_or_default(),
        }
    }

    /// Error without a source location, e.g. for build-level failures.
    pub fn build(code: &str, message: &str, file: &str) -> Self {
        Self::new(code, message, file, 0, 0)
    }

    pub fn io(err: std::io::Error, path: &std::path::Path) -> Self {
        Self::build(ERR_IO, &err.to_string(), &path.display().to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompilerError>;
