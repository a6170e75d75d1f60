//! Top-level transform entry points.
//!
//! parse → collect sites → plan (casts, declarations, call arguments) →
//! mutate the module → print.

use anyhow::Result;
use sat_ast::{ExpressionKind, Options};
use sat_parser::parse_typescript;

use crate::collect::collect_sites;
use crate::print::{printer_for, Edit};
use crate::rewrite::{apply, Planner};

const DEFAULT_FILENAME: &str = "input.ts";

/// One rewritten site, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// 1-based line of the rewritten expression.
    pub line: usize,
    pub kind: ExpressionKind,
    /// The type the expression now satisfies, as written in the source.
    pub type_text: String,
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub code: String,
    /// Rewritten sites in document order.
    pub rewrites: Vec<RewriteReport>,
}

impl TransformOutput {
    pub fn changed(&self) -> bool {
        !self.rewrites.is_empty()
    }
}

/// Rewrite a TypeScript module, returning the new source text.
///
/// Source without eligible sites is returned unchanged.
pub fn transform(source: &str, options: &Options) -> Result<String> {
    Ok(transform_file(source, DEFAULT_FILENAME, options)?.code)
}

/// Rewrite one file. `filename` selects TSX parsing (`.tsx`) and labels
/// diagnostics.
pub fn transform_file(source: &str, filename: &str, options: &Options) -> Result<TransformOutput> {
    let mut parsed = parse_typescript(source, filename)?;

    let sites = collect_sites(&parsed.module);
    let plans = Planner::new(&parsed, options).plan(&sites);
    tracing::info!(
        filename,
        candidates = sites.len(),
        rewritten = plans.len(),
        "planned rewrites"
    );

    if plans.is_empty() {
        return Ok(TransformOutput {
            code: source.to_string(),
            rewrites: Vec::new(),
        });
    }

    let mut located: Vec<_> = plans
        .iter()
        .map(|plan| {
            tracing::debug!(
                addr = ?plan.addr,
                kind = %plan.kind,
                ty = %plan.type_text,
                "rewriting site"
            );
            (
                plan.pos,
                RewriteReport {
                    line: parsed.line(plan.pos),
                    kind: plan.kind,
                    type_text: plan.type_text.clone(),
                },
            )
        })
        .collect();
    located.sort_by_key(|(pos, _)| *pos);
    let rewrites = located.into_iter().map(|(_, report)| report).collect();

    apply(&mut parsed.module, &plans);

    let edits: Vec<Edit> = plans.into_iter().flat_map(|plan| plan.edits).collect();
    let code = printer_for(options.print).print(&parsed, &edits)?;

    Ok(TransformOutput { code, rewrites })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sat_ast::PrintMode;

    fn run(source: &str) -> String {
        transform(source, &Options::default()).unwrap()
    }

    fn run_with(source: &str, options: Options) -> String {
        transform(source, &options).unwrap()
    }

    #[test]
    fn simple_types() {
        assert_eq!(
            run("const applicationLevelRoutes: Model = { label: 'Label' };"),
            "const applicationLevelRoutes = { label: 'Label' } satisfies Model;"
        );
    }

    #[test]
    fn array_types() {
        assert_eq!(
            run("const applicationLevelRoutes: Model[] = [ { label: 'Label' } ];"),
            "const applicationLevelRoutes = [ { label: 'Label' } ] satisfies Model[];"
        );
    }

    #[test]
    fn generic_types() {
        assert_eq!(
            run("const meta: Meta<Foo> = { title: 'Title' }; "),
            "const meta = { title: 'Title' } satisfies Meta<Foo>; "
        );
    }

    #[test]
    fn multiple_declarations() {
        assert_eq!(
            run("const A = {} as Foo, B: Bar = {};"),
            "const A = {} satisfies Foo, B = {} satisfies Bar;"
        );
    }

    #[test]
    fn annotation_and_cast_together() {
        assert_eq!(run("const A: Foo = {} as Foo;"), "const A = {} satisfies Foo;");
    }

    #[test]
    fn function_arguments() {
        assert_eq!(
            run("build({ field: null, isVisible: true } as Foo);"),
            "build({ field: null, isVisible: true } satisfies Foo);"
        );
    }

    #[test]
    fn angle_bracket_casts_normalise_to_satisfies() {
        assert_eq!(run("const a = <Foo>{ x: 1 };"), "const a = { x: 1 } satisfies Foo;");
        assert_eq!(
            run("const a = <Foo>{ x: 1 };"),
            run("const a = { x: 1 } as Foo;")
        );
    }

    #[test]
    fn default_exports() {
        assert_eq!(
            run("export default { a: 1 } as Config;"),
            "export default { a: 1 } satisfies Config;"
        );
        assert_eq!(
            run("export default <Config>[1, 2];"),
            "export default [1, 2] satisfies Config;"
        );
    }

    #[test]
    fn ineligible_input_is_returned_unchanged() {
        let source = "\
const n: number = 1;
const s = 'x' as string;
const f: Handler = () => {};
const id: Foo = other;
const a = { x: 1 } as any;
const b = ({ x: 1 } as any) as Foo;
const c = { x: 1 } as const;
const d = <const>{ x: 1 };
const e = { x: 1 } as unknown as Foo;
const g: Record<string, number>[] | null = [{ a: 1 }];
build(value as Foo, [] as Foo[]);
";
        assert_eq!(run(source), source);
    }

    #[test]
    fn empty_arrays_are_never_rewritten() {
        let source = "const a: T[] = [];";
        assert_eq!(run(source), source);
        assert_eq!(run_with(source, Options::default().with_types(["T"])), source);
    }

    #[test]
    fn sibling_declarators_are_independent() {
        let options = Options::default().with_types(["U"]);
        assert_eq!(
            run_with("const A = {} as T, B: U = {};", options),
            "const A = {} as T, B = {} satisfies U;"
        );
        let options = Options::default().with_types(["T"]);
        assert_eq!(
            run_with("const A = {} as T, B: U = {};", options),
            "const A = {} satisfies T, B: U = {};"
        );
    }

    #[test]
    fn call_arguments_are_rewritten_individually() {
        let source = "f({ foo: null } as T, { bar: null } as U);";
        assert_eq!(run(source), "f({ foo: null } satisfies T, { bar: null } satisfies U);");
        assert_eq!(
            run_with(source, Options::default().with_types(["T"])),
            "f({ foo: null } satisfies T, { bar: null } as U);"
        );
    }

    #[test]
    fn union_and_intersection_match_any_member() {
        assert_eq!(
            run_with(
                "const a: A | B = { x: 1 };",
                Options::default().with_types(["B"])
            ),
            "const a = { x: 1 } satisfies A | B;"
        );
        assert_eq!(
            run_with("const a = { x: 1 } as A & B;", Options::default().with_types(["A"])),
            "const a = { x: 1 } satisfies A & B;"
        );
        let untouched = "const a: A & B = { x: 1 };";
        assert_eq!(
            run_with(untouched, Options::default().with_types(["C"])),
            untouched
        );
    }

    #[test]
    fn expression_kind_restriction() {
        let source = "const a: Foo = { x: 1 };\nconst b = { y: 2 } as Foo;";
        assert_eq!(
            run_with(
                source,
                Options::default().with_expressions([ExpressionKind::Cast])
            ),
            "const a: Foo = { x: 1 };\nconst b = { y: 2 } satisfies Foo;"
        );
        assert_eq!(
            run_with(
                source,
                Options::default().with_expressions([ExpressionKind::Declaration])
            ),
            "const a = { x: 1 } satisfies Foo;\nconst b = { y: 2 } as Foo;"
        );
    }

    #[test]
    fn destructuring() {
        assert_eq!(
            run("const { a }: Foo = { a: 1 } as Foo;"),
            "const { a } = { a: 1 } satisfies Foo;"
        );
        let annotated_only = "const { a }: Foo = { a: 1 };";
        assert_eq!(run(annotated_only), annotated_only);
    }

    #[test]
    fn nested_sites_are_all_rewritten() {
        assert_eq!(
            run("const a: Config = { run: f({ b: 1 } as B) };"),
            "const a = { run: f({ b: 1 } satisfies B) } satisfies Config;"
        );
    }

    #[test]
    fn formatting_and_comments_are_preserved() {
        let source = "\
// routes
const routes: Route[] = [
  { path: '/' }, // home
];
";
        assert_eq!(
            run(source),
            "\
// routes
const routes = [
  { path: '/' }, // home
] satisfies Route[];
"
        );
    }

    #[test]
    fn transform_is_idempotent() {
        let source = "\
const a: Foo = { x: 1 };
const b = [1, 2] as Bar[];
export default <Baz>{ c: build({ d: 1 } as D) };
";
        let once = run(source);
        assert_ne!(once, source);
        assert_eq!(run(&once), once);
    }

    #[test]
    fn restrictions_only_remove_rewrites() {
        let source = "\
const a: Foo = { x: 1 };
const b = { y: 2 } as Bar;
f({ z: 3 } as Foo | Baz);
";
        let all = transform_file(source, "input.ts", &Options::default()).unwrap();
        let restricted =
            transform_file(source, "input.ts", &Options::default().with_types(["Foo"])).unwrap();
        assert_eq!(all.rewrites.len(), 3);
        assert_eq!(restricted.rewrites.len(), 2);
        assert!(restricted.rewrites.iter().all(|r| all.rewrites.contains(r)));
    }

    #[test]
    fn reports_are_in_document_order() {
        let source = "f({ a: 1 } as A);\nconst b: B = { b: 1 };\nconst c = { c: 1 } as C;\n";
        let output = transform_file(source, "input.ts", &Options::default()).unwrap();
        let summary: Vec<_> = output
            .rewrites
            .iter()
            .map(|r| (r.line, r.kind, r.type_text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, ExpressionKind::Cast, "A"),
                (2, ExpressionKind::Declaration, "B"),
                (3, ExpressionKind::Cast, "C"),
            ]
        );
        assert!(output.changed());
    }

    #[test]
    fn reprint_mode_emits_the_mutated_module() {
        let options = Options::default().with_print(PrintMode::Reprint);
        let output = run_with("const a: Foo = { x: 1 };\nbuild([1] as Bar);", options);
        assert!(output.contains("satisfies Foo"), "{output}");
        assert!(output.contains("satisfies Bar"), "{output}");
        assert!(!output.contains("a: Foo"), "{output}");
        assert!(!output.contains(" as "), "{output}");
    }

    #[test]
    fn reprint_mode_without_rewrites_is_identity() {
        let source = "const   a = 1 ;";
        let options = Options::default().with_print(PrintMode::Reprint);
        assert_eq!(run_with(source, options), source);
    }

    #[test]
    fn tsx_files_rewrite_as_casts() {
        let source = "const el = <div />;\nconst props = { id: 1 } as Props;";
        let output = transform_file(source, "view.tsx", &Options::default()).unwrap();
        assert_eq!(
            output.code,
            "const el = <div />;\nconst props = { id: 1 } satisfies Props;"
        );
    }

    #[test]
    fn byte_order_mark_is_kept_and_spans_line_up() {
        assert_eq!(
            run("\u{feff}const a: Foo = { x: 1 };\n"),
            "\u{feff}const a = { x: 1 } satisfies Foo;\n"
        );
        assert_eq!(
            run("\u{feff}f({ x: 1 } as T);"),
            "\u{feff}f({ x: 1 } satisfies T);"
        );
        let options = Options::default().with_print(PrintMode::Reprint);
        let reprinted = run_with("\u{feff}const a: Foo = { x: 1 };\n", options);
        assert!(reprinted.starts_with('\u{feff}'), "{reprinted:?}");
        assert!(reprinted.contains("satisfies Foo"), "{reprinted}");
    }

    #[test]
    fn comments_next_to_casts_survive() {
        assert_eq!(
            run("const a = { x: 1 } /* c */ as T;"),
            "const a = { x: 1 } /* c */ satisfies T;"
        );
        assert_eq!(
            run("f({ x: 1 } // c\n  as T);"),
            "f({ x: 1 } // c\n  satisfies T);"
        );
        assert_eq!(
            run("const a = <T>/* c */ { x: 1 };"),
            "const a = /* c */ { x: 1 } satisfies T;"
        );
    }

    #[test]
    fn optional_call_arguments() {
        assert_eq!(run("a?.({ x: 1 } as T);"), "a?.({ x: 1 } satisfies T);");
        assert_eq!(
            run("obj.run?.([1] as U[], { y: 2 } as V);"),
            "obj.run?.([1] satisfies U[], { y: 2 } satisfies V);"
        );
        let options = Options::default().with_print(PrintMode::Reprint);
        let reprinted = run_with("a?.({ x: 1 } as T);", options);
        assert!(reprinted.contains("satisfies T"), "{reprinted}");
    }

    #[test]
    fn parenthesised_call_arguments() {
        assert_eq!(run("f(({ x: 1 } as T));"), "f(({ x: 1 } satisfies T));");
        let untouched = "f(({ x: 1 }) as T);";
        assert_eq!(run(untouched), untouched);
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(transform("const a: = ;", &Options::default()).is_err());
    }
}
