// src/tables.rs
//
// The two classification side tables, keyed by parse-time NodeId. Populated
// once per unit by the analysis pass, read-only afterward.

use murre_frontend::ast::NodeId;
use rustc_hash::FxHashMap;

use crate::kinds::MemoKind;

#[derive(Debug, Default)]
pub struct ClassifierTables {
    script_functions: FxHashMap<NodeId, MemoKind>,
    function_types: FxHashMap<NodeId, MemoKind>,
}

impl ClassifierTables {
    pub fn record_function(&mut self, node: NodeId, kind: MemoKind) {
        self.script_functions.insert(node, kind);
    }

    pub fn record_function_type(&mut self, node: NodeId, kind: MemoKind) {
        self.function_types.insert(node, kind);
    }

    /// Kind of a script function; unregistered nodes are `None`.
    pub fn function_kind(&self, node: NodeId) -> MemoKind {
        self.script_functions.get(&node).copied().unwrap_or_default()
    }

    /// Kind of a function-type node; unregistered nodes are `None`.
    pub fn function_type_kind(&self, node: NodeId) -> MemoKind {
        self.function_types.get(&node).copied().unwrap_or_default()
    }

    pub fn classified_function_count(&self) -> usize {
        self.script_functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_nodes_default_to_none() {
        let tables = ClassifierTables::default();
        assert_eq!(tables.function_kind(NodeId::new_for_test(7)), MemoKind::None);
        assert_eq!(
            tables.function_type_kind(NodeId::new_for_test(7)),
            MemoKind::None
        );
    }

    #[test]
    fn the_two_tables_are_independent() {
        let mut tables = ClassifierTables::default();
        let node = NodeId::new_for_test(3);
        tables.record_function(node, MemoKind::Memo);
        assert_eq!(tables.function_kind(node), MemoKind::Memo);
        assert_eq!(tables.function_type_kind(node), MemoKind::None);
    }
}
