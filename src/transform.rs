//! Export rewriter.
//!
//! Walks a module's top-level statements, asks the classifier about every
//! exported component, and rewrites the islands so that the exported value is
//! `wrapper(component, exportedName, componentId, modulePath)`.
//!
//! The rewrite is two-phase: [`plan_exports`] scans the tree and records span
//! edits plus deferred appends, [`ExportPlan::apply`] splices them into the
//! original text. The statement list is never mutated while it is scanned.

use log::debug;
#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::{
    BindingPattern, Declaration, ExportDefaultDeclarationKind, ExportSpecifier,
    ImportDeclarationSpecifier, ModuleExportName, Program, Statement, VariableDeclaration,
    VariableDeclarationKind,
};
use oxc_span::{GetSpan, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::bindings::{gather_bindings, Bindings};
use crate::classify::{is_island, ComponentNode};
use crate::error::Result;
use crate::options::{export_name_text, js_string, sanitize_identifier, WrapperDescriptor};
use crate::parse::{apply_edits, parse_module, slice, Edit};
use crate::registry::derive_alias;

pub const DEFAULT_EXPORT: &str = "default";

/// Ordered island export names of one module. `"default"` stands for the default export.
pub type ExportManifest = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct ProcessedModule {
    pub code: String,
    pub manifest: ExportManifest,
}

/// Scan result: everything needed to rewrite the module text.
#[derive(Debug, Clone, Default)]
pub struct ExportPlan {
    pub edits: Vec<Edit>,
    pub appends: Vec<String>,
    pub manifest: ExportManifest,
}

impl ExportPlan {
    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    pub fn apply(self, source: &str) -> String {
        let mut code = apply_edits(source, self.edits);
        if !self.appends.is_empty() {
            if !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&self.appends.join("\n"));
            code.push('\n');
        }
        code
    }
}

/// Parse, plan and apply in one go. `Ok(None)` means no export qualified and
/// the module should pass through untouched.
pub fn process_exports(
    source: &str,
    module_path: &str,
    wrapper_name: &str,
    wrapper_import: Option<&WrapperDescriptor>,
) -> Result<Option<ProcessedModule>> {
    let allocator = Allocator::default();
    let program = parse_module(&allocator, source, module_path)?;

    let plan = plan_exports(&program, source, module_path, wrapper_name, wrapper_import);
    if plan.is_empty() {
        return Ok(None);
    }

    let manifest = plan.manifest.clone();
    Ok(Some(ProcessedModule {
        code: plan.apply(source),
        manifest,
    }))
}

pub fn plan_exports(
    program: &Program<'_>,
    source: &str,
    module_path: &str,
    wrapper_name: &str,
    wrapper_import: Option<&WrapperDescriptor>,
) -> ExportPlan {
    let mut rewriter = ExportRewriter {
        source,
        module_path,
        wrapper_name,
        bindings: gather_bindings(program),
        island_vars: HashSet::new(),
        plan: ExportPlan::default(),
    };

    for stmt in &program.body {
        match stmt {
            Statement::ExportDefaultDeclaration(export) => {
                rewriter.rewrite_default(&export.declaration);
            }
            Statement::ExportNamedDeclaration(export) => {
                if export.source.is_some() || export.export_kind.is_type() {
                    continue;
                }
                match &export.declaration {
                    Some(Declaration::FunctionDeclaration(func)) => {
                        if let Some(id) = &func.id {
                            rewriter.unexport_declaration(
                                export.span,
                                func.span,
                                id.name.as_str(),
                                ComponentNode::Function(func),
                            );
                        }
                    }
                    Some(Declaration::ClassDeclaration(class)) => {
                        if let Some(id) = &class.id {
                            rewriter.unexport_declaration(
                                export.span,
                                class.span,
                                id.name.as_str(),
                                ComponentNode::Class(class),
                            );
                        }
                    }
                    Some(Declaration::VariableDeclaration(var)) => {
                        rewriter.rewrite_variable_export(export.span, var);
                    }
                    Some(_) => {}
                    None => rewriter.rewrite_specifiers(export.span, &export.specifiers),
                }
            }
            _ => {}
        }
    }

    let mut plan = rewriter.plan;
    if !plan.manifest.is_empty() {
        if let Some(wrapper) = wrapper_import {
            if let Some(edit) = wrapper_import_edit(program, wrapper) {
                plan.edits.push(edit);
            }
        }
    }
    plan
}

struct ExportRewriter<'s, 'n, 'a> {
    source: &'s str,
    module_path: &'s str,
    wrapper_name: &'s str,
    bindings: Bindings<'n, 'a>,
    island_vars: HashSet<String>,
    plan: ExportPlan,
}

impl<'s, 'n, 'a> ExportRewriter<'s, 'n, 'a> {
    fn wrap_call(&self, expr: &str, exported: &str) -> String {
        format!(
            "{}({}, {}, {}, {})",
            self.wrapper_name,
            expr,
            js_string(exported),
            js_string(&derive_alias(self.module_path, exported)),
            js_string(self.module_path)
        )
    }

    fn record(&mut self, exported: &str) {
        debug!("island export `{}` in {}", exported, self.module_path);
        if !self.plan.manifest.iter().any(|name| name == exported) {
            self.plan.manifest.push(exported.to_string());
        }
    }

    /// `__<local>Island`, or `__<local>_<exported>Island` when the local is
    /// exported under another name. Unique within the module.
    fn island_var(&mut self, local: &str, exported: &str) -> String {
        let base = if local == exported {
            format!("__{}Island", local)
        } else {
            format!("__{}_{}Island", local, sanitize_identifier(exported))
        };
        let mut name = base.clone();
        let mut n = 1;
        while !self.island_vars.insert(name.clone()) {
            name = format!("{}{}", base, n);
            n += 1;
        }
        name
    }

    /// Append `const __<local>Island = wrapper(local, ...)` and re-export it
    /// under the original exported name.
    fn queue_island(&mut self, local: &str, exported: &str) {
        let island_var = self.island_var(local, exported);
        let call = self.wrap_call(local, exported);
        self.plan.appends.push(format!(
            "const {} = {};\nexport {{ {} as {} }};",
            island_var,
            call,
            island_var,
            export_name_text(exported)
        ));
        self.record(exported);
    }

    fn rewrite_default(&mut self, kind: &'n ExportDefaultDeclarationKind<'a>) {
        let (node, span, is_declaration) = match kind {
            ExportDefaultDeclarationKind::Identifier(ident) => {
                match self.bindings.get(ident.name.as_str()) {
                    Some(node) => (*node, ident.span, false),
                    None => return,
                }
            }
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                (ComponentNode::Function(func), func.span, true)
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                (ComponentNode::Class(class), class.span, true)
            }
            other => match other.as_expression().and_then(ComponentNode::from_expression) {
                Some(node) => (node, other.span(), false),
                None => return,
            },
        };

        if !is_island(node) {
            return;
        }

        let mut wrapped = self.wrap_call(slice(self.source, span), DEFAULT_EXPORT);
        // A declaration carried no terminating semicolon of its own.
        if is_declaration {
            wrapped.push(';');
        }
        self.plan.edits.push(Edit::replace(span, wrapped));
        self.record(DEFAULT_EXPORT);
    }

    /// `export function F() {}` becomes `function F() {}` plus a wrapped re-export.
    fn unexport_declaration(
        &mut self,
        export_span: Span,
        decl_span: Span,
        name: &str,
        node: ComponentNode<'n, 'a>,
    ) {
        if !is_island(node) {
            return;
        }
        self.plan
            .edits
            .push(Edit::remove(export_span.start, decl_span.start));
        self.queue_island(name, name);
    }

    fn rewrite_variable_export(&mut self, export_span: Span, var: &'n VariableDeclaration<'a>) {
        let kind = match var.kind {
            VariableDeclarationKind::Var => "var",
            VariableDeclarationKind::Let => "let",
            VariableDeclarationKind::Const => "const",
            _ => return,
        };

        // Island declarators stay in place, unexported; the rest keep their
        // own `export`. One statement per declarator preserves evaluation order.
        let mut statements = Vec::with_capacity(var.declarations.len());
        let mut islands = Vec::new();
        for decl in &var.declarations {
            let island_name = match (&decl.id, &decl.init) {
                (BindingPattern::BindingIdentifier(id), Some(init)) => {
                    ComponentNode::from_expression(init)
                        .filter(|node| is_island(*node))
                        .map(|_| id.name.as_str())
                }
                _ => None,
            };
            let text = slice(self.source, decl.span);
            match island_name {
                Some(name) => {
                    statements.push(format!("{} {};", kind, text));
                    islands.push(name);
                }
                None => statements.push(format!("export {} {};", kind, text)),
            }
        }

        if islands.is_empty() {
            return;
        }

        self.plan
            .edits
            .push(Edit::replace(export_span, statements.join(" ")));
        for name in islands {
            self.queue_island(name, name);
        }
    }

    fn rewrite_specifiers(
        &mut self,
        export_span: Span,
        specifiers: &'n ArenaVec<'a, ExportSpecifier<'a>>,
    ) {
        let mut kept = Vec::new();
        let mut islands = Vec::new();
        for spec in specifiers {
            let local = module_export_name(&spec.local);
            let exported = module_export_name(&spec.exported);
            let accepted = !spec.export_kind.is_type()
                && self
                    .bindings
                    .get(local)
                    .is_some_and(|node| is_island(*node));
            if accepted {
                islands.push((local, exported));
            } else {
                kept.push(slice(self.source, spec.span));
            }
        }

        if islands.is_empty() {
            return;
        }

        let replacement = if kept.is_empty() {
            String::new()
        } else {
            format!("export {{ {} }};", kept.join(", "))
        };
        self.plan.edits.push(Edit::replace(export_span, replacement));

        for (local, exported) in islands {
            self.queue_island(local, exported);
        }
    }
}

fn module_export_name<'n>(name: &'n ModuleExportName<'_>) -> &'n str {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.as_str(),
        ModuleExportName::IdentifierReference(id) => id.name.as_str(),
        ModuleExportName::StringLiteral(s) => s.value.as_str(),
    }
}

fn has_wrapper_import(program: &Program<'_>, wrapper: &WrapperDescriptor) -> bool {
    program.body.iter().any(|stmt| {
        let Statement::ImportDeclaration(import) = stmt else {
            return false;
        };
        if import.source.value.as_str() != wrapper.module_path {
            return false;
        }
        import.specifiers.as_ref().is_some_and(|specifiers| {
            specifiers.iter().any(|specifier| match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    wrapper.is_named_export && s.local.name.as_str() == wrapper.exported_name
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    !wrapper.is_named_export && s.local.name.as_str() == wrapper.exported_name
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => false,
            })
        })
    })
}

/// Insert the wrapper import after the hashbang and directive prologue, unless
/// an identical import already exists.
fn wrapper_import_edit(program: &Program<'_>, wrapper: &WrapperDescriptor) -> Option<Edit> {
    if has_wrapper_import(program, wrapper) {
        return None;
    }

    let statement = wrapper.import_statement();
    let at = program
        .directives
        .last()
        .map(|d| d.span.end)
        .or_else(|| program.hashbang.as_ref().map(|h| h.span.end));

    Some(match at {
        Some(at) => Edit::insert(at, format!("\n{}", statement)),
        None => Edit::insert(0, format!("{}\n", statement)),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn process_exports_native(
    code: String,
    id: String,
    options_json: Option<String>,
) -> napi::Result<ProcessedModule> {
    let options = match options_json {
        Some(json) => crate::options::IslandsOptions::from_json(&json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => crate::options::IslandsOptions::default(),
    };
    let processed = process_exports(
        &code,
        &id,
        &options.wrapper.exported_name,
        Some(&options.wrapper),
    )
    .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    Ok(processed.unwrap_or(ProcessedModule {
        code,
        manifest: Vec::new(),
    }))
}
