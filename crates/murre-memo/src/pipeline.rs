// src/pipeline.rs
//
// The two plugin stages. The parsed stage runs before any checking and only
// makes the hidden-parameter types importable; the checked stage lowers,
// resolves, classifies, checks, and rewrites the unit, optionally dumping
// the rewritten source next to the build for inspection.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use murre_frontend::ast::*;
use murre_frontend::desugar::desugar_program;
use murre_frontend::printer::print_program;
use murre_frontend::resolve::resolve_program;
use murre_frontend::{Interner, Span};

use crate::analysis::analyze_program;
use crate::call_id::CallIdTracker;
use crate::catalog::build_catalog;
use crate::diagnostics::check_program;
use crate::errors::{MemoDiagnostic, MemoError};
use crate::factory::Factory;
use crate::function::transform_program;
use crate::names::RuntimeNames;

/// Where the hidden-parameter types come from unless the build overrides it.
pub const DEFAULT_CONTEXT_IMPORT: &str = "@memo/runtime";

#[derive(Debug, Clone)]
pub struct MemoOptions {
    /// Module specifier for the injected runtime-type import.
    pub context_import: String,
    /// Deterministic string positional ids instead of hashed ones.
    pub stable_for_tests: bool,
    /// Directory to dump rewritten units into, when set.
    pub keep_transformed: Option<PathBuf>,
    /// Emit `console.log` probes for cache-state changes.
    pub debug_log: bool,
    /// Track the trailing `content` builder parameter like any other.
    pub track_content_params: bool,
}

impl Default for MemoOptions {
    fn default() -> Self {
        Self {
            context_import: DEFAULT_CONTEXT_IMPORT.to_string(),
            stable_for_tests: false,
            keep_transformed: None,
            debug_log: false,
            track_content_params: false,
        }
    }
}

/// What the checked stage hands back for reporting.
#[derive(Debug)]
pub struct CheckedOutput {
    pub diagnostics: Vec<MemoDiagnostic>,
    pub modified: bool,
}

/// Inject `import { __memo_context_type, __memo_id_type }` at the top of
/// units that use memo annotations. Returns whether the import was added;
/// units that already import the types are left alone.
#[tracing::instrument(skip(program, interner, options))]
pub fn parsed_stage(
    program: &mut Program,
    interner: &mut Interner,
    options: &MemoOptions,
) -> bool {
    let names = RuntimeNames::new(interner);
    if !uses_memo_annotations(program, &names) {
        return false;
    }
    if has_runtime_import(program, &names) {
        return false;
    }
    let mut factory = Factory::new(&names, interner, program.next_node_id);
    let import = factory.runtime_import(&options.context_import, Span::default());
    program.next_node_id = factory.finish();
    program.statements.insert(0, import);
    debug!(module = %options.context_import, "injected runtime type import");
    true
}

/// Lower, resolve, classify, check, and rewrite one unit. `file` is the
/// unit's path as presented in output and positional ids.
#[tracing::instrument(skip(program, interner, options))]
pub fn checked_stage(
    program: &mut Program,
    interner: &mut Interner,
    file: &str,
    options: &MemoOptions,
) -> Result<CheckedOutput, MemoError> {
    desugar_program(program, interner);
    let names = RuntimeNames::new(interner);
    let bindings = resolve_program(program, interner);
    let catalog = build_catalog(program, &names, interner)?;
    let tables = analyze_program(program, &catalog, &bindings, &names, interner)?;
    debug!(
        functions = tables.classified_function_count(),
        "classification complete"
    );
    let diagnostics = check_program(program, &tables, &catalog, &bindings, interner)?;

    let mut tracker = CallIdTracker::new(file, options.stable_for_tests);
    let mut factory = Factory::new(&names, interner, program.next_node_id);
    let modified = transform_program(
        program,
        &tables,
        &catalog,
        &bindings,
        options,
        &mut tracker,
        &mut factory,
    );
    program.next_node_id = factory.finish();

    if modified {
        if let Some(dir) = &options.keep_transformed {
            dump_transformed(program, interner, file, dir)?;
        }
    }
    Ok(CheckedOutput {
        diagnostics,
        modified,
    })
}

/// Write the rewritten unit to `<dir>/<stem>.memo.uis`.
fn dump_transformed(
    program: &Program,
    interner: &Interner,
    file: &str,
    dir: &Path,
) -> Result<(), MemoError> {
    let stem = Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unit");
    let path = dir.join(format!("{stem}.memo.uis"));
    let write = fs::create_dir_all(dir).and_then(|()| fs::write(&path, print_program(program, interner)));
    write.map_err(|source| MemoError::DumpFailed {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "kept transformed unit");
    Ok(())
}

// -----------------------------------------------------------------------
// Annotation scan for the parsed stage
// -----------------------------------------------------------------------

fn has_runtime_import(program: &Program, names: &RuntimeNames) -> bool {
    program.statements.iter().any(|stmt| {
        matches!(stmt, Stmt::Import(import) if import.names.contains(&names.context_type))
    })
}

fn uses_memo_annotations(program: &Program, names: &RuntimeNames) -> bool {
    program
        .statements
        .iter()
        .any(|stmt| stmt_uses_memo(stmt, names))
}

fn annotated(annotations: &[Annotation], names: &RuntimeNames) -> bool {
    annotations.iter().any(|a| names.is_memo_annotation(a.name))
}

fn function_uses_memo(func: &Function, names: &RuntimeNames) -> bool {
    annotated(&func.annotations, names)
        || func.params.iter().any(|p| param_uses_memo(p, names))
        || func
            .return_type
            .as_ref()
            .is_some_and(|t| type_uses_memo(t, names))
        || match &func.body {
            FuncBody::Block(block) => block.stmts.iter().any(|s| stmt_uses_memo(s, names)),
            FuncBody::Expr(expr) => expr_uses_memo(expr, names),
        }
}

fn param_uses_memo(param: &Param, names: &RuntimeNames) -> bool {
    annotated(&param.annotations, names)
        || param.ty.as_ref().is_some_and(|t| type_uses_memo(t, names))
        || param
            .default
            .as_ref()
            .is_some_and(|e| expr_uses_memo(e, names))
}

fn type_uses_memo(ty: &TypeExpr, names: &RuntimeNames) -> bool {
    match &ty.kind {
        TypeKind::Function(ft) => {
            annotated(&ft.annotations, names)
                || ft.params.iter().any(|p| param_uses_memo(p, names))
                || type_uses_memo(&ft.return_type, names)
        }
        TypeKind::Union(members) => members.iter().any(|t| type_uses_memo(t, names)),
        TypeKind::Named { type_args, .. } => type_args.iter().any(|t| type_uses_memo(t, names)),
        TypeKind::This | TypeKind::Void | TypeKind::Undefined => false,
    }
}

fn stmt_uses_memo(stmt: &Stmt, names: &RuntimeNames) -> bool {
    match stmt {
        Stmt::Function(func) => function_uses_memo(func, names),
        Stmt::Variable(decl) => {
            annotated(&decl.annotations, names)
                || decl.declarators.iter().any(|d| {
                    d.ty.as_ref().is_some_and(|t| type_uses_memo(t, names))
                        || d.init.as_ref().is_some_and(|e| expr_uses_memo(e, names))
                })
        }
        Stmt::Class(class) => {
            annotated(&class.annotations, names)
                || class.members.iter().any(|member| match member {
                    ClassMember::Method(method) => function_uses_memo(&method.func, names),
                    ClassMember::Property(prop) => {
                        annotated(&prop.annotations, names)
                            || prop.ty.as_ref().is_some_and(|t| type_uses_memo(t, names))
                            || prop.init.as_ref().is_some_and(|e| expr_uses_memo(e, names))
                    }
                })
        }
        Stmt::TypeAlias(alias) => {
            annotated(&alias.annotations, names) || type_uses_memo(&alias.ty, names)
        }
        Stmt::Return(ret) => ret.value.as_ref().is_some_and(|e| expr_uses_memo(e, names)),
        Stmt::If(stmt) => {
            expr_uses_memo(&stmt.test, names)
                || stmt.consequent.stmts.iter().any(|s| stmt_uses_memo(s, names))
                || stmt
                    .alternate
                    .as_ref()
                    .is_some_and(|b| b.stmts.iter().any(|s| stmt_uses_memo(s, names)))
        }
        Stmt::While(stmt) => {
            expr_uses_memo(&stmt.test, names)
                || stmt.body.stmts.iter().any(|s| stmt_uses_memo(s, names))
        }
        Stmt::Throw(stmt) => expr_uses_memo(&stmt.value, names),
        Stmt::Expr(stmt) => expr_uses_memo(&stmt.expr, names),
        Stmt::Block(block) => block.stmts.iter().any(|s| stmt_uses_memo(s, names)),
        Stmt::Import(_) => false,
    }
}

fn expr_uses_memo(expr: &Expr, names: &RuntimeNames) -> bool {
    match &expr.kind {
        ExprKind::Arrow(func) => function_uses_memo(func, names),
        ExprKind::Call(call) => {
            expr_uses_memo(&call.callee, names)
                || call.type_args.iter().any(|t| type_uses_memo(t, names))
                || call.args.iter().any(|a| expr_uses_memo(a, names))
        }
        ExprKind::Member(member) => expr_uses_memo(&member.object, names),
        ExprKind::Conditional(cond) => {
            expr_uses_memo(&cond.test, names)
                || expr_uses_memo(&cond.consequent, names)
                || expr_uses_memo(&cond.alternate, names)
        }
        ExprKind::Binary(binary) => {
            expr_uses_memo(&binary.left, names) || expr_uses_memo(&binary.right, names)
        }
        ExprKind::Unary(unary) => expr_uses_memo(&unary.operand, names),
        ExprKind::Assign(assign) => {
            expr_uses_memo(&assign.target, names) || expr_uses_memo(&assign.value, names)
        }
        ExprKind::ObjectLiteral(object) => {
            object.fields.iter().any(|f| expr_uses_memo(&f.value, names))
        }
        ExprKind::ArrayLiteral(elements) => elements.iter().any(|e| expr_uses_memo(e, names)),
        ExprKind::As(cast) => {
            expr_uses_memo(&cast.expr, names) || type_uses_memo(&cast.ty, names)
        }
        ExprKind::Paren(inner) => expr_uses_memo(inner, names),
        ExprKind::Identifier(_)
        | ExprKind::This
        | ExprKind::Undefined
        | ExprKind::NumberLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::BoolLiteral(_) => false,
    }
}
