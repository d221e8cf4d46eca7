//! Export rewriter behavior over whole modules.

#[cfg(test)]
mod tests {
    use crate::error::ERR_PARSE;
    use crate::options::WrapperDescriptor;
    use crate::registry::derive_alias;
    use crate::transform::{process_exports, ProcessedModule};
    use pretty_assertions::assert_eq;

    const IMPORT: &str = "import { withHydration } from \"islands-compiler/runtime\";";

    fn run(source: &str, path: &str) -> Option<ProcessedModule> {
        process_exports(
            source,
            path,
            "withHydration",
            Some(&WrapperDescriptor::default()),
        )
        .unwrap()
    }

    fn manifest(source: &str, path: &str) -> Vec<String> {
        run(source, path).map(|m| m.manifest).unwrap_or_default()
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DEFAULT EXPORTS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_default_function_with_hook() {
        let source = "export default function Card(){ return <div>{useState(0)}</div> }";
        let out = run(source, "/src/Card.jsx").unwrap();

        assert_eq!(out.manifest, vec!["default"]);
        assert_eq!(
            out.code,
            format!(
                "{}\nexport default withHydration(function Card(){{ return <div>{{useState(0)}}</div> }}, \"default\", \"{}\", \"/src/Card.jsx\");",
                IMPORT,
                derive_alias("/src/Card.jsx", "default")
            )
        );
    }

    #[test]
    fn test_static_component_is_untouched() {
        let source = "export function Static(){ return <p>hi</p> }";
        assert!(run(source, "/src/Static.jsx").is_none());
    }

    #[test]
    fn test_default_identifier_resolves_binding() {
        let source = "function Page() { const s = useStore(); return <main>{s}</main>; }\nexport default Page;";
        let out = run(source, "/src/Page.jsx").unwrap();
        assert!(out.code.contains(&format!(
            "export default withHydration(Page, \"default\", \"{}\", \"/src/Page.jsx\");",
            derive_alias("/src/Page.jsx", "default")
        )));
    }

    #[test]
    fn test_default_arrow_and_anonymous_function() {
        let arrow = "export default () => { useEffect(() => {}); return <div />; };";
        assert_eq!(manifest(arrow, "/src/a.jsx"), vec!["default"]);

        let anonymous = "export default function () { useRef(); return <div />; }";
        let out = run(anonymous, "/src/b.jsx").unwrap();
        assert!(out.code.contains("export default withHydration(function () {"));
    }

    #[test]
    fn test_class_with_component_did_mount() {
        let source = r#"
            export default class Clock extends Component {
                componentDidMount() { this.timer = setInterval(() => this.tick(), 1000); }
                render() { return <time>{this.state.now}</time>; }
            }
        "#;
        assert_eq!(manifest(source, "/src/Clock.jsx"), vec!["default"]);

        let without_mount = r#"
            export default class Label extends Component {
                render() { return <span>{this.props.text}</span>; }
            }
        "#;
        assert!(run(without_mount, "/src/Label.jsx").is_none());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // NAMED EXPORTS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_named_function_is_reexported_through_wrapper() {
        let source = "export function Counter() { const [n] = useState(0); return <b>{n}</b>; }";
        let out = run(source, "/src/Counter.jsx").unwrap();

        assert_eq!(out.manifest, vec!["Counter"]);
        assert_eq!(
            out.code,
            format!(
                "{}\nfunction Counter() {{ const [n] = useState(0); return <b>{{n}}</b>; }}\n\
                 const __CounterIsland = withHydration(Counter, \"Counter\", \"{}\", \"/src/Counter.jsx\");\n\
                 export {{ __CounterIsland as Counter }};\n",
                IMPORT,
                derive_alias("/src/Counter.jsx", "Counter")
            )
        );
    }

    #[test]
    fn test_export_const_keeps_static_declarators() {
        let source = r#"export const Btn = () => { const on = useClick(); return <button onClick={on} />; }, label = "x";"#;
        let out = run(source, "/src/Btn.jsx").unwrap();

        assert_eq!(out.manifest, vec!["Btn"]);
        assert!(out.code.contains("export const label = \"x\";"));
        assert!(out.code.contains("const Btn = () => {"));
        assert!(out.code.contains("export { __BtnIsland as Btn };"));
        assert!(!out.code.contains("export const Btn"));
    }

    #[test]
    fn test_export_const_stays_before_default_reference() {
        let source = "export const Card = () => { useState(); return <div />; };\nexport default Card;";
        let out = run(source, "/src/Card.jsx").unwrap();

        assert_eq!(out.manifest, vec!["Card", "default"]);
        let declared_at = out.code.find("const Card = () =>").unwrap();
        let used_at = out.code.find("export default withHydration(Card,").unwrap();
        assert!(declared_at < used_at, "declaration moved after use:\n{}", out.code);
    }

    #[test]
    fn test_island_exported_under_two_names() {
        let sources = [
            "export function Card(){ useState(); return <div />; }\nexport { Card as FancyCard };",
            "function Card(){ useState(); return <div />; }\nexport { Card, Card as Other };",
        ];
        for source in sources {
            let out = run(source, "/src/Card.jsx").unwrap();
            assert_eq!(out.manifest.len(), 2);
            assert_eq!(out.code.matches("const __CardIsland =").count(), 1);
            for exported in &out.manifest {
                if exported != "Card" {
                    let var = format!("const __Card_{}Island =", exported);
                    assert_eq!(out.code.matches(var.as_str()).count(), 1, "{}", out.code);
                }
            }
        }
    }

    #[test]
    fn test_export_specifiers_split() {
        let source = "function A() { useX(); return <div />; }\nconst B = 1;\nexport { A as Alpha, B };";
        let out = run(source, "/src/ab.jsx").unwrap();

        assert_eq!(out.manifest, vec!["Alpha"]);
        assert!(out.code.contains("export { B };"));
        assert!(out.code.contains(&format!(
            "const __AIsland = withHydration(A, \"Alpha\", \"{}\", \"/src/ab.jsx\");\nexport {{ __AIsland as Alpha }};",
            derive_alias("/src/ab.jsx", "Alpha")
        )));
    }

    #[test]
    fn test_manifest_keeps_source_order() {
        let source = r#"
            export function First() { useA(); return <i />; }
            export function Plain() { return <i />; }
            export const Second = () => { useB(); return <i />; };
            export default function () { useC(); return <i />; }
        "#;
        assert_eq!(
            manifest(source, "/src/many.jsx"),
            vec!["First", "Second", "default"]
        );
    }

    #[test]
    fn test_reexports_and_type_exports_are_skipped() {
        let source = "export { default } from \"./Other\";\nexport * from \"./all\";";
        assert!(run(source, "/src/index.js").is_none());

        let ts = "type Props = { n: number };\nexport type { Props };";
        assert!(run(ts, "/src/types.ts").is_none());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CLASSIFIER GATES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_use_island_directive_opts_in() {
        let source = r#"export const Hero = () => { "use island"; return <section />; };"#;
        assert_eq!(manifest(source, "/src/Hero.jsx"), vec!["Hero"]);
    }

    #[test]
    fn test_markup_gate_rejects_hooks_without_markup() {
        let source = "export function useCounter() { const [n] = useState(0); return n; }";
        assert!(run(source, "/src/useCounter.js").is_none());

        let directive_only = r#"export function Util() { "use island"; return 42; }"#;
        assert!(run(directive_only, "/src/util.js").is_none());
    }

    #[test]
    fn test_compiled_factories_count_as_markup() {
        let jsx_runtime = r#"export function Btn() { const s = useState(); return _jsx("button", {}); }"#;
        assert_eq!(manifest(jsx_runtime, "/dist/Btn.js"), vec!["Btn"]);

        let create_element =
            r#"export function Nav() { React.useState(0); return React.createElement("nav"); }"#;
        assert_eq!(manifest(create_element, "/dist/Nav.js"), vec!["Nav"]);
    }

    #[test]
    fn test_typescript_component() {
        let source = "export function Card({ n }: { n: number }) { const [v] = useState<number>(n); return <p>{v}</p>; }";
        assert_eq!(manifest(source, "/src/Card.tsx"), vec!["Card"]);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // WRAPPER IMPORT AND IDEMPOTENCE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_existing_wrapper_import_not_duplicated() {
        let source = format!(
            "{}\nexport function Counter() {{ useState(); return <b />; }}",
            IMPORT
        );
        let out = run(&source, "/src/Counter.jsx").unwrap();
        assert_eq!(out.code.matches(IMPORT).count(), 1);
    }

    #[test]
    fn test_import_follows_directive_prologue() {
        let source = "\"use client\";\nexport function C() { useX(); return <a />; }";
        let out = run(source, "/src/C.jsx").unwrap();

        assert!(out.code.starts_with("\"use client\""));
        let import_at = out.code.find(IMPORT).unwrap();
        assert!(import_at < out.code.find("function C").unwrap());
        // Output must still parse.
        assert!(run(&out.code, "/src/C.jsx").is_none());
    }

    #[test]
    fn test_no_wrapper_import_when_not_requested() {
        let source = "export function Counter() { useState(); return <b />; }";
        let out = process_exports(source, "/src/Counter.jsx", "wrap", None)
            .unwrap()
            .unwrap();
        assert!(!out.code.contains("import"));
        assert!(out.code.contains("const __CounterIsland = wrap(Counter,"));
    }

    #[test]
    fn test_second_pass_is_noop() {
        let sources = [
            "export default function Card(){ return <div>{useState(0)}</div> }",
            "export function Counter() { const [n] = useState(0); return <b>{n}</b>; }",
            "export const A = () => { useX(); return <i />; }, b = 2;",
            "function A() { useX(); return <div />; }\nexport { A as Alpha };",
        ];
        for source in sources {
            let once = run(source, "/src/m.jsx").unwrap();
            assert!(
                run(&once.code, "/src/m.jsx").is_none(),
                "second pass rewrote:\n{}",
                once.code
            );
        }
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = process_exports("export default function (", "/src/bad.jsx", "w", None)
            .unwrap_err();
        assert_eq!(err.code, ERR_PARSE);
        assert_eq!(err.file, "/src/bad.jsx");
    }
}
