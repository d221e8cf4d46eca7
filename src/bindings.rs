//! Top-level bindings of a module.
//!
//! A single, non-recursive pass over the module body that records which
//! top-level names are bound to a function, class or arrow function. Used by
//! the export rewriter to resolve `export default Name` and `export { Name }`.

use oxc_ast::ast::{
    BindingPattern, Class, Declaration, ExportDefaultDeclarationKind, Function, Program,
    Statement, VariableDeclaration,
};
use std::collections::HashMap;

use crate::classify::ComponentNode;

pub type Bindings<'n, 'a> = HashMap<&'n str, ComponentNode<'n, 'a>>;

pub fn gather_bindings<'n, 'a>(program: &'n Program<'a>) -> Bindings<'n, 'a> {
    let mut bindings = HashMap::new();

    for stmt in &program.body {
        match stmt {
            Statement::FunctionDeclaration(func) => bind_function(&mut bindings, func),
            Statement::ClassDeclaration(class) => bind_class(&mut bindings, class),
            Statement::VariableDeclaration(var) => bind_variables(&mut bindings, var),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::FunctionDeclaration(func)) => bind_function(&mut bindings, func),
                Some(Declaration::ClassDeclaration(class)) => bind_class(&mut bindings, class),
                Some(Declaration::VariableDeclaration(var)) => bind_variables(&mut bindings, var),
                _ => {}
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                    bind_function(&mut bindings, func)
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    bind_class(&mut bindings, class)
                }
                _ => {}
            },
            _ => {}
        }
    }

    bindings
}

fn bind_function<'n, 'a>(bindings: &mut Bindings<'n, 'a>, func: &'n Function<'a>) {
    if let Some(id) = &func.id {
        bindings.insert(id.name.as_str(), ComponentNode::Function(func));
    }
}

fn bind_class<'n, 'a>(bindings: &mut Bindings<'n, 'a>, class: &'n Class<'a>) {
    if let Some(id) = &class.id {
        bindings.insert(id.name.as_str(), ComponentNode::Class(class));
    }
}

fn bind_variables<'n, 'a>(bindings: &mut Bindings<'n, 'a>, var: &'n VariableDeclaration<'a>) {
    for decl in &var.declarations {
        let BindingPattern::BindingIdentifier(id) = &decl.id else {
            continue;
        };
        if let Some(node) = decl.init.as_ref().and_then(ComponentNode::from_expression) {
            bindings.insert(id.name.as_str(), node);
        }
    }
}
