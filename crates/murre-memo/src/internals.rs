// src/internals.rs
//
// Rewrites the three compiler-intrinsic call markers into their
// runtime-visible equivalents: `__context()` becomes the hidden context
// identifier, `__id()` the hidden id identifier, and `__key()` a freshly
// minted positional id. Purely syntactic; no classification lookup.

use murre_frontend::ast::*;

use crate::call_id::CallIdTracker;
use crate::factory::Factory;
use crate::walk;

pub fn rewrite_markers(block: &mut Block, factory: &mut Factory, tracker: &mut CallIdTracker) {
    let (marker_context, marker_id, marker_key, context, id) = {
        let names = factory.names();
        (
            names.marker_context,
            names.marker_id,
            names.marker_key,
            names.context,
            names.id,
        )
    };
    walk::walk_block(block, &mut |expr| {
        let ExprKind::Call(call) = &expr.kind else {
            return;
        };
        if !call.args.is_empty() {
            return;
        }
        let ExprKind::Identifier(name) = &call.callee.kind else {
            return;
        };
        let name = *name;
        let span = expr.span;
        if name == marker_context {
            *expr = factory.ident(context, span);
        } else if name == marker_id {
            *expr = factory.ident(id, span);
        } else if name == marker_key {
            let pos = tracker.fresh(None);
            *expr = factory.pos_id(&pos, span);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::RuntimeNames;
    use murre_frontend::printer::print_program;
    use murre_frontend::Parser;

    fn rewrite(source: &str) -> String {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        let names = RuntimeNames::new(&mut interner);
        let mut factory = Factory::new(&names, &mut interner, program.next_node_id);
        let mut tracker = CallIdTracker::new("demo.uis", true);
        let Stmt::Function(func) = &mut program.statements[0] else {
            panic!("expected function");
        };
        let FuncBody::Block(block) = &mut func.body else {
            panic!("expected block body");
        };
        rewrite_markers(block, &mut factory, &mut tracker);
        program.next_node_id = factory.finish();
        print_program(&program, &interner)
    }

    #[test]
    fn markers_become_runtime_names() {
        let out = rewrite("function f(): void { use(__context(), __id(), __key()) }");
        assert!(out.contains("use(__memo_context, __memo_id, \"id_anonymous0_demo.uis\")"));
    }

    #[test]
    fn markers_inside_nested_closures_are_rewritten() {
        let out = rewrite("function f(): void { const g = () => __context() }");
        assert!(out.contains("const g = () => __memo_context"));
    }

    #[test]
    fn calls_with_arguments_are_not_markers() {
        let out = rewrite("function f(): void { __context(1) }");
        assert!(out.contains("__context(1)"));
    }
}
