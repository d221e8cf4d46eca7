//! Island classifier.
//!
//! Decides, per component-shaped node, whether the component needs to be
//! hydrated in the browser. This is a heuristic: it never resolves types or
//! follows imports, it only looks at the node's own syntax.
//!
//! Order of checks:
//! 1. A markup return (JSX or a compiled factory call) is required; anything else is static.
//! 2. A leading `"use island"` directive opts in.
//! 3. A class declaring `componentDidMount` opts in.
//! 4. Any call to a `useXxx` hook anywhere in the node opts in.

use lazy_static::lazy_static;
use oxc_ast::ast::{
    ArrowFunctionExpression, CallExpression, Class, ClassElement, Expression, Function,
    FunctionBody, MethodDefinition, PropertyKey, Statement,
};
use oxc_ast_visit::{walk, Visit};
use regex::Regex;

pub const USE_ISLAND_DIRECTIVE: &str = "use island";

/// Runtime factory names that compiled JSX turns into.
pub const MARKUP_FACTORIES: &[&str] = &[
    "jsx",
    "jsxs",
    "jsxDEV",
    "_jsx",
    "_jsxs",
    "_jsxDEV",
    "createElement",
    "h",
];

lazy_static! {
    static ref HOOK_NAME_RE: Regex = Regex::new(r"^use[A-Z]").unwrap();
}

/// A function-like or class-like node the classifier understands.
#[derive(Debug, Clone, Copy)]
pub enum ComponentNode<'n, 'a> {
    Function(&'n Function<'a>),
    Arrow(&'n ArrowFunctionExpression<'a>),
    Class(&'n Class<'a>),
}

impl<'n, 'a> ComponentNode<'n, 'a> {
    /// Component-shaped expressions: function, arrow or class expressions,
    /// possibly parenthesized.
    pub fn from_expression(expr: &'n Expression<'a>) -> Option<Self> {
        match without_parens(expr) {
            Expression::FunctionExpression(func) => Some(Self::Function(func)),
            Expression::ArrowFunctionExpression(arrow) => Some(Self::Arrow(arrow)),
            Expression::ClassExpression(class) => Some(Self::Class(class)),
            _ => None,
        }
    }
}

struct FunctionParts<'n, 'a> {
    body: &'n FunctionBody<'a>,
    return_expr: &'n Expression<'a>,
}

pub fn is_island(node: ComponentNode<'_, '_>) -> bool {
    let Some(parts) = function_parts(node) else {
        return false;
    };

    if !is_markup(parts.return_expr) {
        return false;
    }

    if has_island_directive(parts.body) {
        return true;
    }

    if let ComponentNode::Class(class) = node {
        if find_method(class, |name| name == "componentDidMount").is_some() {
            return true;
        }
    }

    calls_hook(node)
}

fn function_parts<'n, 'a>(node: ComponentNode<'n, 'a>) -> Option<FunctionParts<'n, 'a>> {
    match node {
        ComponentNode::Function(func) => {
            let body = func.body.as_deref()?;
            Some(FunctionParts {
                body,
                return_expr: first_return(body)?,
            })
        }
        ComponentNode::Arrow(arrow) => {
            let body: &'n FunctionBody<'a> = &arrow.body;
            let return_expr = if arrow.expression {
                match body.statements.first() {
                    Some(Statement::ExpressionStatement(stmt)) => &stmt.expression,
                    _ => return None,
                }
            } else {
                first_return(body)?
            };
            Some(FunctionParts { body, return_expr })
        }
        ComponentNode::Class(class) => {
            let render = find_method(class, |name| name.eq_ignore_ascii_case("render"))?;
            function_parts(ComponentNode::Function(&render.value))
        }
    }
}

fn first_return<'n, 'a>(body: &'n FunctionBody<'a>) -> Option<&'n Expression<'a>> {
    body.statements
        .iter()
        .find_map(|stmt| match stmt {
            Statement::ReturnStatement(ret) => Some(ret),
            _ => None,
        })?
        .argument
        .as_ref()
}

fn find_method<'n, 'a>(
    class: &'n Class<'a>,
    matches: impl Fn(&str) -> bool,
) -> Option<&'n MethodDefinition<'a>> {
    class.body.body.iter().find_map(|element| match element {
        ClassElement::MethodDefinition(method) => {
            method_name(&method.key).filter(|name| matches(name))?;
            Some(&**method)
        }
        _ => None,
    })
}

fn method_name<'n>(key: &'n PropertyKey<'_>) -> Option<&'n str> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.as_str()),
        PropertyKey::StringLiteral(s) => Some(s.value.as_str()),
        _ => None,
    }
}

pub(crate) fn without_parens<'n, 'a>(mut expr: &'n Expression<'a>) -> &'n Expression<'a> {
    while let Expression::ParenthesizedExpression(paren) = expr {
        expr = &paren.expression;
    }
    expr
}

/// Raw JSX, or a call to one of the compiled-JSX factories.
pub fn is_markup(expr: &Expression<'_>) -> bool {
    match without_parens(expr) {
        Expression::JSXElement(_) | Expression::JSXFragment(_) => true,
        Expression::CallExpression(call) => {
            callee_name(&call.callee).is_some_and(|name| MARKUP_FACTORIES.contains(&name))
        }
        _ => false,
    }
}

/// Name a call resolves to syntactically: `f()`, `ns.f()` and `(0, ns.f)()` all give `f`.
fn callee_name<'n>(callee: &'n Expression<'_>) -> Option<&'n str> {
    match callee {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::StaticMemberExpression(member) => Some(member.property.name.as_str()),
        Expression::ParenthesizedExpression(paren) => callee_name(&paren.expression),
        Expression::SequenceExpression(seq) => seq.expressions.last().and_then(callee_name),
        _ => None,
    }
}

fn has_island_directive(body: &FunctionBody<'_>) -> bool {
    if let Some(directive) = body.directives.first() {
        return directive.expression.value == USE_ISLAND_DIRECTIVE;
    }
    // Prologues that oxc did not lift into directives (e.g. after a parse recovery).
    matches!(
        body.statements.first(),
        Some(Statement::ExpressionStatement(stmt))
            if matches!(&stmt.expression, Expression::StringLiteral(s) if s.value == USE_ISLAND_DIRECTIVE)
    )
}

pub fn is_hook_name(name: &str) -> bool {
    HOOK_NAME_RE.is_match(name)
}

fn calls_hook(node: ComponentNode<'_, '_>) -> bool {
    let mut finder = HookFinder { found: false };
    match node {
        ComponentNode::Function(func) => {
            if let Some(body) = func.body.as_deref() {
                finder.visit_function_body(body);
            }
        }
        ComponentNode::Arrow(arrow) => finder.visit_function_body(&arrow.body),
        ComponentNode::Class(class) => finder.visit_class(class),
    }
    finder.found
}

struct HookFinder {
    found: bool,
}

impl<'a> Visit<'a> for HookFinder {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.found {
            return;
        }
        if callee_name(&call.callee).is_some_and(is_hook_name) {
            self.found = true;
            return;
        }
        walk::walk_call_expression(self, call);
    }
}
