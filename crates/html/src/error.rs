use thiserror::Error;

/// What made a fragment structurally unusable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// Input ended while the element was still open.
    UnclosedElement { name: String },
    /// End tag with no open element of that name.
    UnexpectedEndTag { name: String },
    /// End tag that would close an element other than the current one.
    MismatchedEndTag { expected: String, found: String },
    VoidElementWithChildren { name: String },
    /// A tree operation was handed a node that cannot have children.
    NotAContainer,
    /// A flat event sequence did not describe a tree.
    UnbalancedEvents,
}

/// Malformed input tree. Fatal: the caller has to fix the markup.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}", describe(.kind, .position))]
pub struct StructuralError {
    pub kind: StructuralErrorKind,
    /// Token index at which the problem was detected, when parsing.
    pub position: Option<usize>,
}

impl StructuralError {
    pub fn new(kind: StructuralErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    pub fn at(kind: StructuralErrorKind, position: usize) -> Self {
        Self {
            kind,
            position: Some(position),
        }
    }
}

fn describe(kind: &StructuralErrorKind, position: &Option<usize>) -> String {
    let what = match kind {
        StructuralErrorKind::UnclosedElement { name } => format!("unclosed <{name}>"),
        StructuralErrorKind::UnexpectedEndTag { name } => format!("unexpected </{name}>"),
        StructuralErrorKind::MismatchedEndTag { expected, found } => {
            format!("expected </{expected}>, found </{found}>")
        }
        StructuralErrorKind::VoidElementWithChildren { name } => {
            format!("void element <{name}> has children")
        }
        StructuralErrorKind::NotAContainer => "node cannot contain children".to_string(),
        StructuralErrorKind::UnbalancedEvents => "unbalanced open/close events".to_string(),
    };
    match position {
        Some(pos) => format!("malformed html at token {pos}: {what}"),
        None => format!("malformed html: {what}"),
    }
}
