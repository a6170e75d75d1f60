//! TypeScript AST and rewrite options for tsat.
//!
//! Re-exports the standard SWC AST and adds the configuration vocabulary
//! shared by the parser, the rewriter and the CLI:
//! - `types`: restrict rewrites to sites referencing one of these type names
//! - `expressions`: restrict rewrites to declaration-style or cast-style sites
//! - `print`: splice edits into the original text, or reprint the whole module

pub use swc_ecma_ast::*;

use serde::{Deserialize, Serialize};

/// Syntactic shape of a rewrite site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionKind {
    /// `const x: T = { ... }`, an annotated binding with a literal initializer.
    Declaration,
    /// `{ ... } as T` or `<T>{ ... }`.
    Cast,
}

impl std::fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionKind::Declaration => write!(f, "declaration"),
            ExpressionKind::Cast => write!(f, "cast"),
        }
    }
}

impl std::str::FromStr for ExpressionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "declaration" => Ok(ExpressionKind::Declaration),
            "cast" => Ok(ExpressionKind::Cast),
            other => Err(format!(
                "unknown expression kind `{other}` (expected `declaration` or `cast`)"
            )),
        }
    }
}

/// How the rewritten module is turned back into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    /// Splice the rewrites into the original source; everything else is untouched.
    #[default]
    Preserve,
    /// Emit the mutated module with the SWC code generator.
    Reprint,
}

/// Options recognised by the transform.
///
/// `None` means "no restriction". An empty list is a restriction that
/// nothing satisfies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub types: Option<Vec<String>>,
    pub expressions: Option<Vec<ExpressionKind>>,
    pub print: PrintMode,
}

impl Options {
    /// Restrict rewrites to the given type names.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in types {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        self.types = Some(names);
        self
    }

    /// Restrict rewrites to the given syntactic shapes.
    pub fn with_expressions<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = ExpressionKind>,
    {
        let mut allowed = Vec::new();
        for kind in kinds {
            if !allowed.contains(&kind) {
                allowed.push(kind);
            }
        }
        self.expressions = Some(allowed);
        self
    }

    pub fn with_print(mut self, print: PrintMode) -> Self {
        self.print = print;
        self
    }

    /// Whether sites of this shape may be rewritten.
    pub fn allows_kind(&self, kind: ExpressionKind) -> bool {
        self.expressions
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&kind))
    }

    /// Whether at least one of `names` passes the type-name restriction.
    pub fn allows_any_type<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        match &self.types {
            None => true,
            Some(allowed) => names
                .into_iter()
                .any(|name| allowed.iter().any(|a| a == name)),
        }
    }
}
