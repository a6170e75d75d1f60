//! The decision whether a site may be rewritten.
//!
//! All checks must pass; a site that fails any of them is left exactly as
//! it was written.

use sat_ast::{ExpressionKind, Options};

use crate::collect::Literal;
use crate::shape::TypeShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The asserted expression is not an object or non-empty array literal.
    NotLiteral,
    /// The type is not a named reference, an array of one, or a union or
    /// intersection of those.
    InvalidType,
    /// None of the type's names is in the `types` restriction.
    TypeNotAllowed,
    /// The site's shape is excluded by the `expressions` restriction.
    KindNotAllowed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotLiteral => write!(f, "not an object or array literal"),
            SkipReason::InvalidType => write!(f, "unsupported type shape"),
            SkipReason::TypeNotAllowed => write!(f, "type not in restriction"),
            SkipReason::KindNotAllowed => write!(f, "expression kind not allowed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    Skip(SkipReason),
}

impl Verdict {
    pub fn is_eligible(self) -> bool {
        self == Verdict::Eligible
    }
}

/// Decide whether `literal`, asserted against `shape` through a site of
/// shape `kind`, should become a `satisfies` expression.
pub fn eligible(
    literal: Literal,
    shape: &TypeShape,
    kind: ExpressionKind,
    options: &Options,
) -> Verdict {
    if !matches!(literal, Literal::Object | Literal::Array) {
        return Verdict::Skip(SkipReason::NotLiteral);
    }
    if !shape.is_valid() {
        return Verdict::Skip(SkipReason::InvalidType);
    }
    if !options.allows_any_type(shape.names()) {
        return Verdict::Skip(SkipReason::TypeNotAllowed);
    }
    if !options.allows_kind(kind) {
        return Verdict::Skip(SkipReason::KindNotAllowed);
    }
    Verdict::Eligible
}
