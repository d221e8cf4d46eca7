//! UI-library providers.
//!
//! Everything specific to a rendering library sits behind [`Provider`]: which
//! wrapper the server-side rewrite calls, and how the client bundle text is put
//! together from import lines, alias variables and extra code.

use std::fmt::Debug;

use crate::options::{js_string, IslandsOptions, WrapperDescriptor};

pub trait Provider: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn wrapper(&self) -> &WrapperDescriptor;

    fn stringify(&self, imports: &[String], variables: &[String], code: &[String]) -> String;
}

/// Provider for runtimes exposing `hydrate(lookupTable)`: the bundle imports
/// every island under its alias and hands the alias table to the runtime,
/// which matches it against the component ids in the server markers.
#[derive(Debug, Clone)]
pub struct DefaultProvider {
    wrapper: WrapperDescriptor,
    runtime_module: String,
    hydrate_export: String,
}

impl DefaultProvider {
    pub fn new(options: &IslandsOptions) -> Self {
        Self {
            wrapper: options.wrapper.clone(),
            runtime_module: options.runtime_module.clone(),
            hydrate_export: options.hydrate_export.clone(),
        }
    }
}

impl Default for DefaultProvider {
    fn default() -> Self {
        Self::new(&IslandsOptions::default())
    }
}

impl Provider for DefaultProvider {
    fn name(&self) -> &str {
        "default"
    }

    fn wrapper(&self) -> &WrapperDescriptor {
        &self.wrapper
    }

    fn stringify(&self, imports: &[String], variables: &[String], code: &[String]) -> String {
        let mut out = format!(
            "import {{ {} }} from {};\n",
            self.hydrate_export,
            js_string(&self.runtime_module)
        );
        for line in imports {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!(
            "{}({{ {} }});\n",
            self.hydrate_export,
            variables.join(", ")
        ));
        for line in code {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_stringify() {
        let provider = DefaultProvider::default();
        let text = provider.stringify(
            &["import { A as A_1 } from \"/a.jsx\";".to_string()],
            &["A_1".to_string()],
            &["console.debug(\"ready\");".to_string()],
        );
        assert_eq!(
            text,
            "import { hydrateIslands } from \"islands-compiler/runtime\";\n\
             import { A as A_1 } from \"/a.jsx\";\n\
             hydrateIslands({ A_1 });\n\
             console.debug(\"ready\");\n"
        );
    }
}
