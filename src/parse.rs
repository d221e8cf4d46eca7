//! Syntax-tree toolkit.
//!
//! Modules are parsed with oxc into an arena-owned [`Program`]. Rewrites do not
//! rebuild the tree; they are recorded as span [`Edit`]s against the original
//! text and spliced in one pass, so code the rewriter never touched comes out
//! byte-for-byte identical.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::error::{CompilerError, Result, ERR_PARSE};

/// Pick a source type from the module id. Every non-TS module is parsed with JSX on,
/// plain `.ts` keeps JSX off so generic arrows (`<T>(x: T) => x`) stay parseable.
pub fn source_type_for(path: &str) -> SourceType {
    let path = path.split('?').next().unwrap_or(path);
    let is_tsx = path.ends_with(".tsx");
    let is_ts = is_tsx || path.ends_with(".ts") || path.ends_with(".mts") || path.ends_with(".cts");

    SourceType::default()
        .with_module(true)
        .with_typescript(is_ts)
        .with_jsx(is_tsx || !is_ts)
}

/// Parse a module. The first diagnostic becomes a located `ISL-PARSE` error.
pub fn parse_module<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &str,
) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, source, source_type_for(path)).parse();

    if let Some(err) = ret.errors.first() {
        let offset = err
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset())
            .unwrap_or(0);
        let (line, column) = line_column(source, offset);
        return Err(CompilerError::with_details(
            ERR_PARSE,
            &err.to_string(),
            path,
            line,
            column,
            Some(format!("{} diagnostic(s) while parsing", ret.errors.len())),
        ));
    }

    Ok(ret.program)
}

/// Print a tree back to text.
pub fn print_program(program: &Program<'_>) -> String {
    Codegen::new().build(program).code
}

/// 1-based line and column of a byte offset.
pub fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() as u32 + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() as u32 + 1,
        None => before.chars().count() as u32 + 1,
    };
    (line, column)
}

pub fn slice<'s>(source: &'s str, span: Span) -> &'s str {
    &source[span.start as usize..span.end as usize]
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPAN EDITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Replace `start..end` of the original text with `text`.
/// An empty range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: u32,
    pub end: u32,
    pub text: String,
}

impl Edit {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            text: text.into(),
        }
    }

    pub fn remove(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            text: String::new(),
        }
    }

    pub fn insert(at: u32, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }
}

/// Apply non-overlapping edits. Offsets always refer to the original text,
/// so edits are spliced back to front.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut result = source.to_string();
    for edit in edits {
        result.replace_range(edit.start as usize..edit.end as usize, &edit.text);
    }
    result
}
