// src/names.rs
//
// Canonical identifier names the rewrite relies on, interned once per unit.

use murre_frontend::{Interner, Symbol};

/// Prefix for the per-parameter cache-cell bindings.
pub const PARAMETER_PREFIX: &str = "__memo_parameter_";

/// Every runtime-visible or annotation name the plugin consumes or emits.
///
/// Built once per compilation unit so the passes compare interned symbols
/// instead of strings.
pub struct RuntimeNames {
    // Hidden parameters and their types.
    pub context: Symbol,
    pub id: Symbol,
    pub context_type: Symbol,
    pub id_type: Symbol,

    // The synthesized scope binding and the runtime methods on it.
    pub scope: Symbol,
    pub scope_method: Symbol,
    pub param_method: Symbol,
    pub cached: Symbol,
    pub unchanged: Symbol,
    pub recache: Symbol,
    pub compute: Symbol,
    pub value: Symbol,

    // Intrinsic markers rewritten by the internals pass.
    pub marker_context: Symbol,
    pub marker_id: Symbol,
    pub marker_key: Symbol,

    // Annotations.
    pub memo: Symbol,
    pub memo_intrinsic: Symbol,
    pub memo_entry: Symbol,
    pub memo_skip: Symbol,
    pub memo_stable: Symbol,

    // Conventions.
    pub content: Symbol,
    pub this_name: Symbol,

    // Debug logging.
    pub console: Symbol,
    pub log: Symbol,
    pub changed: Symbol,
}

impl RuntimeNames {
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            context: interner.intern("__memo_context"),
            id: interner.intern("__memo_id"),
            context_type: interner.intern("__memo_context_type"),
            id_type: interner.intern("__memo_id_type"),
            scope: interner.intern("__memo_scope"),
            scope_method: interner.intern("scope"),
            param_method: interner.intern("param"),
            cached: interner.intern("cached"),
            unchanged: interner.intern("unchanged"),
            recache: interner.intern("recache"),
            compute: interner.intern("compute"),
            value: interner.intern("value"),
            marker_context: interner.intern("__context"),
            marker_id: interner.intern("__id"),
            marker_key: interner.intern("__key"),
            memo: interner.intern("memo"),
            memo_intrinsic: interner.intern("memo_intrinsic"),
            memo_entry: interner.intern("memo_entry"),
            memo_skip: interner.intern("memo_skip"),
            memo_stable: interner.intern("memo_stable"),
            content: interner.intern("content"),
            this_name: interner.intern("this"),
            console: interner.intern("console"),
            log: interner.intern("log"),
            changed: interner.intern("changed"),
        }
    }

    /// `__memo_parameter_<name>` for a tracked parameter.
    pub fn cache_cell(&self, interner: &mut Interner, param: Symbol) -> Symbol {
        interner.intern_with_prefix(PARAMETER_PREFIX, param)
    }

    /// True when any annotation in the list is a memo-kind annotation, i.e.
    /// when the unit needs the runtime import.
    pub fn is_memo_annotation(&self, name: Symbol) -> bool {
        name == self.memo || name == self.memo_intrinsic || name == self.memo_entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_cell_name_uses_parameter_prefix() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        let count = interner.intern("count");
        let cell = names.cache_cell(&mut interner, count);
        assert_eq!(interner.resolve(cell), "__memo_parameter_count");
    }

    #[test]
    fn memo_annotation_classification() {
        let mut interner = Interner::new();
        let names = RuntimeNames::new(&mut interner);
        assert!(names.is_memo_annotation(names.memo));
        assert!(names.is_memo_annotation(names.memo_entry));
        assert!(!names.is_memo_annotation(names.memo_skip));
        assert!(!names.is_memo_annotation(names.memo_stable));
    }
}
