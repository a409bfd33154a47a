// tests/plugin.rs
//! End-to-end plugin runs over complete units: both stages in sequence,
//! the dump artifact, and diagnostics surfaced through the checked stage.

use murre_frontend::Parser;
use murre_frontend::printer::print_program;
use murre_memo::{CheckedOutput, MemoOptions, checked_stage, parsed_stage};

fn stable_options() -> MemoOptions {
    MemoOptions {
        stable_for_tests: true,
        ..MemoOptions::default()
    }
}

/// Parse one unit and run both plugin stages over it, returning the printed
/// result alongside the checked-stage output.
fn run_unit(source: &str, file: &str, options: &MemoOptions) -> (String, CheckedOutput) {
    let mut parser = Parser::new(source);
    let mut program = parser.parse_program().expect("unit should parse");
    let mut interner = parser.into_interner();
    parsed_stage(&mut program, &mut interner, options);
    let output = checked_stage(&mut program, &mut interner, file, options)
        .expect("checked stage should succeed");
    (print_program(&program, &interner), output)
}

#[test]
fn full_builder_unit_is_rewritten_end_to_end() {
    let source = "\
@memo function item(label: string): void {
  show(label)
}
@memo function card(style: CardStyle, content: @memo () => void): void {
  item(\"header\")
  content()
}
@memo_entry function boot(__memo_context: __memo_context_type, __memo_id: __memo_id_type): void {
  card({ width: 10 }, (): void => {
    item(\"body\")
  })
}
function show(text: string): void {
  text
}";
    let (out, output) = run_unit(source, "demo.uis", &stable_options());
    assert!(output.modified);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    // The parsed stage injected the runtime types at the top of the unit.
    assert!(
        out.starts_with("\nimport { __memo_context_type, __memo_id_type } from \"@memo/runtime\""),
        "{out}"
    );

    // Memoized signatures grow the hidden parameters; the entry keeps its own.
    assert!(
        out.contains(
            "function item(__memo_context: __memo_context_type, \
             __memo_id: __memo_id_type, label: string): void {"
        ),
        "{out}"
    );
    assert!(
        out.contains(
            "function boot(__memo_context: __memo_context_type, \
             __memo_id: __memo_id_type): void {"
        ),
        "{out}"
    );

    // The untracked trailing content parameter leaves card with one cache slot.
    assert!(
        out.contains("const __memo_scope = __memo_context.scope<void>(__memo_id + \"id_card_demo.uis\", 1)"),
        "{out}"
    );
    assert!(
        out.contains("const __memo_parameter_style = __memo_scope.param(0, style)"),
        "{out}"
    );

    // Calls forward the hidden arguments, through parameters included.
    assert!(
        out.contains("item(__memo_context, __memo_id + \"id_item_demo.uis\", \"header\")"),
        "{out}"
    );
    assert!(
        out.contains("content(__memo_context, __memo_id + \"id_content_demo.uis\")"),
        "{out}"
    );

    // The object-literal argument is computed with a cast to the declared
    // parameter type, and the inline content arrow is itself memoized.
    assert!(
        out.contains("__memo_context.compute(\"id_card_demo.uis\", () => ({ width: 10 } as CardStyle))"),
        "{out}"
    );
    assert!(
        out.contains("(__memo_context: __memo_context_type, __memo_id: __memo_id_type): void => {"),
        "{out}"
    );
    assert!(
        out.contains("scope<void>(__memo_id + \"id_anonymous0_demo.uis\", 0)"),
        "{out}"
    );
    assert!(
        out.contains("item(__memo_context, __memo_id + \"id_item_demo.uis\", \"body\")"),
        "{out}"
    );

    // Plain helpers are untouched.
    assert!(
        out.contains("function show(text: string): void {\n  text\n}"),
        "{out}"
    );
}

#[test]
fn keep_transformed_dumps_the_rewritten_unit() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let nested = dir.path().join("out");
    let options = MemoOptions {
        stable_for_tests: true,
        keep_transformed: Some(nested.clone()),
        ..MemoOptions::default()
    };
    let (printed, output) = run_unit("@memo function chip(): void {}", "ui/chip.uis", &options);
    assert!(output.modified);
    let dumped = std::fs::read_to_string(nested.join("chip.memo.uis")).expect("dump should exist");
    assert_eq!(dumped, printed);
}

#[test]
fn untouched_units_are_not_dumped() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let options = MemoOptions {
        keep_transformed: Some(dir.path().to_path_buf()),
        ..MemoOptions::default()
    };
    let (out, output) = run_unit(
        "function add(a: number): number {\n  return a\n}",
        "add.uis",
        &options,
    );
    assert!(!output.modified);
    assert!(!dir.path().join("add.memo.uis").exists());
    assert_eq!(out, "\nfunction add(a: number): number {\n  return a\n}");
}

#[test]
fn default_positional_ids_are_numeric() {
    let (out, _) = run_unit(
        "@memo function chip(): void {}",
        "demo.uis",
        &MemoOptions::default(),
    );
    let marker = "scope<void>(__memo_id + ";
    let at = out.find(marker).expect("scope declaration");
    let next = out[at + marker.len()..].chars().next();
    assert!(next.is_some_and(|c| c.is_ascii_digit()), "{out}");
    assert!(!out.contains("id_chip"), "{out}");
}

#[test]
fn custom_context_import_module_is_honored() {
    let options = MemoOptions {
        context_import: "app/memo".to_string(),
        ..stable_options()
    };
    let (out, _) = run_unit("@memo function chip(): void {}", "demo.uis", &options);
    assert!(
        out.starts_with("\nimport { __memo_context_type, __memo_id_type } from \"app/memo\""),
        "{out}"
    );
}

#[test]
fn missing_return_types_warn_but_do_not_block_the_rewrite() {
    let (out, output) = run_unit("@memo function chip() {}", "demo.uis", &stable_options());
    assert_eq!(output.diagnostics.len(), 1);
    assert!(output.diagnostics[0].to_string().contains("chip"));
    assert!(out.contains("__memo_context.scope<void>"), "{out}");
}

#[test]
fn conflicting_annotations_abort_the_stage() {
    let mut parser = Parser::new("@memo @memo_intrinsic function broken(): void {}");
    let mut program = parser.parse_program().expect("unit should parse");
    let mut interner = parser.into_interner();
    let err = checked_stage(
        &mut program,
        &mut interner,
        "demo.uis",
        &MemoOptions::default(),
    )
    .expect_err("conflicting annotations must be fatal");
    assert!(err.to_string().contains("broken"), "{err}");
}
