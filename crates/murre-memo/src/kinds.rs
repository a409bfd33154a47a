// src/kinds.rs
//
// The classification lattice. One closed enum instead of the historical
// bit mask: a node is exactly one of these, and carrying two memo-kind
// annotations at once is a hard error rather than an undecodable mask value.

use murre_frontend::ast::Annotation;

use crate::errors::MemoError;
use crate::names::RuntimeNames;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoKind {
    /// Ordinary function, untouched.
    #[default]
    None,
    /// Full rewrite: hidden params, caching scaffolding, recache-wrapped
    /// returns.
    Memo,
    /// Signature rewrite only; the body gets the internals fix-up and
    /// nothing else.
    Intrinsic,
    /// Root entry point: participates in propagation and context checks,
    /// excluded from signature extension.
    Entry,
}

impl MemoKind {
    pub fn is_memo(self) -> bool {
        self == MemoKind::Memo
    }

    /// Kinds whose signatures grow the hidden context/id parameters.
    pub fn rewrites_signature(self) -> bool {
        matches!(self, MemoKind::Memo | MemoKind::Intrinsic)
    }

    /// Kinds whose bodies count as a memoized calling context.
    pub fn in_memo_context(self) -> bool {
        matches!(self, MemoKind::Memo | MemoKind::Intrinsic | MemoKind::Entry)
    }

    /// Own kind wins; `None` falls back to the inherited kind.
    pub fn or_inherited(self, inherited: MemoKind) -> MemoKind {
        if self == MemoKind::None {
            inherited
        } else {
            self
        }
    }
}

/// Compute the kind an annotation list declares. More than one memo-kind
/// annotation on the same node is fatal.
pub fn kind_of_annotations(
    annotations: &[Annotation],
    names: &RuntimeNames,
    owner: &str,
) -> Result<MemoKind, MemoError> {
    let mut found = MemoKind::None;
    for annotation in annotations {
        let kind = if annotation.name == names.memo {
            MemoKind::Memo
        } else if annotation.name == names.memo_intrinsic {
            MemoKind::Intrinsic
        } else if annotation.name == names.memo_entry {
            MemoKind::Entry
        } else {
            continue;
        };
        if found != MemoKind::None {
            return Err(MemoError::ConflictingAnnotations {
                name: owner.to_string(),
                span: annotation.span.into(),
            });
        }
        found = kind;
    }
    Ok(found)
}
