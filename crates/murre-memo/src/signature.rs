// src/signature.rs
//
// Prepends the two hidden parameters to memo/intrinsic signatures. A
// receiver parameter stays in front, so `(this: T, x: U)` becomes
// `(this: T, __memo_context: __memo_context_type, __memo_id: __memo_id_type, x: U)`.
// Kind gating is the caller's job; these helpers always extend.

use murre_frontend::ast::*;
use murre_frontend::Span;

use crate::factory::Factory;

pub fn extend_function(func: &mut Function, factory: &mut Factory) {
    extend_params(&mut func.params, func.span, factory);
}

pub fn extend_function_type(ft: &mut FunctionType, factory: &mut Factory) {
    extend_params(&mut ft.params, ft.span, factory);
}

fn extend_params(params: &mut Vec<Param>, span: Span, factory: &mut Factory) {
    let [context, id] = factory.hidden_params(span);
    params.insert(0, id);
    params.insert(0, context);
    if params.len() >= 3 && params[2].is_receiver {
        params[..3].rotate_right(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;
    use crate::names::RuntimeNames;
    use murre_frontend::printer::print_program;
    use murre_frontend::Parser;

    fn extended(source: &str) -> String {
        let mut parser = Parser::new(source);
        let mut program = parser.parse_program().unwrap();
        let mut interner = parser.into_interner();
        let names = RuntimeNames::new(&mut interner);
        let mut factory = Factory::new(&names, &mut interner, program.next_node_id);
        match &mut program.statements[0] {
            Stmt::Function(func) => extend_function(func, &mut factory),
            Stmt::TypeAlias(alias) => {
                let TypeKind::Function(ft) = &mut alias.ty.kind else {
                    panic!("expected function type alias");
                };
                extend_function_type(ft, &mut factory);
            }
            _ => panic!("expected function or type alias"),
        }
        program.next_node_id = factory.finish();
        print_program(&program, &interner)
    }

    #[test]
    fn hidden_params_lead_the_signature() {
        let out = extended("@memo function f(x: number): void {}");
        assert!(out.contains(
            "function f(__memo_context: __memo_context_type, \
             __memo_id: __memo_id_type, x: number): void"
        ));
    }

    #[test]
    fn receiver_stays_first() {
        let out = extended("@memo function style(this: Chip, width: number): this { return this }");
        assert!(out.contains(
            "function style(this: Chip, __memo_context: __memo_context_type, \
             __memo_id: __memo_id_type, width: number): this"
        ));
    }

    #[test]
    fn function_types_extend_the_same_way() {
        let out = extended("type Builder = @memo () => void");
        assert!(out.contains(
            "type Builder = @memo (__memo_context: __memo_context_type, \
             __memo_id: __memo_id_type) => void"
        ));
    }
}
