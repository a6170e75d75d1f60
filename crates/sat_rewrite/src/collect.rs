//! Site collection.
//!
//! A read-only pass over the module that records every place a `satisfies`
//! rewrite could apply: variable declarators, default exports and cast call
//! arguments. Sites are addressed by span so the rewriter can find them
//! again after collection has finished, and carry everything the
//! eligibility check and the text edits need.

use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{
    CallExpr, ExportDefaultExpr, Expr, ExprOrSpread, Module, OptCall, Pat, TsType, TsTypeAnn,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::shape::{classify, TypeShape};

/// Where a site lives in the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteAddr {
    Declarator(Span),
    ExportDefault(Span),
    CallArg { call: Span, index: usize },
    /// Argument of an optional call, `f?.(...)`.
    OptCallArg { call: Span, index: usize },
}

/// Syntactic kind of an asserted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Object,
    Array,
    EmptyArray,
    Other,
}

impl Literal {
    pub fn of(expr: &Expr) -> Self {
        match expr {
            Expr::Object(_) => Literal::Object,
            Expr::Array(array) if array.elems.is_empty() => Literal::EmptyArray,
            Expr::Array(_) => Literal::Array,
            _ => Literal::Other,
        }
    }
}

/// An expression that is the subject of an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub span: Span,
    pub literal: Literal,
}

impl Operand {
    fn of(expr: &Expr) -> Self {
        Operand {
            span: expr.span(),
            literal: Literal::of(expr),
        }
    }
}

/// A type written in the source, with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub span: Span,
    pub shape: TypeShape,
}

impl TypeInfo {
    fn of(ty: &TsType) -> Self {
        TypeInfo {
            span: ty.span(),
            shape: classify(ty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastStyle {
    /// `expr as T`
    As,
    /// `<T>expr`
    AngleBracket,
}

/// `expr as T` or `<T>expr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cast {
    pub span: Span,
    pub style: CastStyle,
    pub operand: Operand,
    pub ty: TypeInfo,
}

impl Cast {
    pub fn of(expr: &Expr) -> Option<Self> {
        let (span, style, operand, ty) = match expr {
            Expr::TsAs(cast) => (cast.span, CastStyle::As, &cast.expr, &cast.type_ann),
            Expr::TsTypeAssertion(cast) => {
                (cast.span, CastStyle::AngleBracket, &cast.expr, &cast.type_ann)
            }
            _ => return None,
        };
        Some(Cast {
            span,
            style,
            operand: Operand::of(operand),
            ty: TypeInfo::of(ty),
        })
    }
}

/// The value bound or exported at a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Cast(Cast),
    Plain(Operand),
}

impl Value {
    fn of(expr: &Expr) -> Self {
        match Cast::of(expr) {
            Some(cast) => Value::Cast(cast),
            None => Value::Plain(Operand::of(expr)),
        }
    }

    /// The expression after looking through one cast.
    pub fn operand(&self) -> Operand {
        match self {
            Value::Cast(cast) => cast.operand,
            Value::Plain(operand) => *operand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Identifier,
    /// Object or array destructuring.
    Pattern,
    Other,
}

/// A binding's `: T` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Text to delete when the annotation is dropped: from the end of an
    /// identifier's name, or from the colon for patterns.
    pub removal: Span,
    pub ty: TypeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub annotation: Option<Annotation>,
}

impl Binding {
    fn of(pat: &Pat) -> Self {
        match pat {
            Pat::Ident(ident) => Binding {
                kind: BindingKind::Identifier,
                annotation: annotation(ident.id.span.hi, ident.type_ann.as_deref()),
            },
            Pat::Object(object) => Binding {
                kind: BindingKind::Pattern,
                annotation: object
                    .type_ann
                    .as_deref()
                    .and_then(|ann| annotation(ann.span.lo, Some(ann))),
            },
            Pat::Array(array) => Binding {
                kind: BindingKind::Pattern,
                annotation: array
                    .type_ann
                    .as_deref()
                    .and_then(|ann| annotation(ann.span.lo, Some(ann))),
            },
            _ => Binding {
                kind: BindingKind::Other,
                annotation: None,
            },
        }
    }
}

fn annotation(from: BytePos, ann: Option<&TsTypeAnn>) -> Option<Annotation> {
    ann.map(|ann| Annotation {
        removal: Span::new(from, ann.span.hi),
        ty: TypeInfo::of(&ann.type_ann),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSite {
    pub span: Span,
    pub binding: Binding,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSite {
    pub span: Span,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgSite {
    pub call: Span,
    /// Whether the call is an optional call.
    pub optional: bool,
    pub index: usize,
    pub cast: Cast,
}

impl CallArgSite {
    pub fn addr(&self) -> SiteAddr {
        let (call, index) = (self.call, self.index);
        if self.optional {
            SiteAddr::OptCallArg { call, index }
        } else {
            SiteAddr::CallArg { call, index }
        }
    }
}

/// Candidate sites, each in document order.
#[derive(Debug, Default)]
pub struct Sites {
    pub declarations: Vec<DeclarationSite>,
    pub exports: Vec<ExportSite>,
    pub call_args: Vec<CallArgSite>,
}

impl Sites {
    pub fn len(&self) -> usize {
        self.declarations.len() + self.exports.len() + self.call_args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collect candidate sites from a module without modifying it.
pub fn collect_sites(module: &Module) -> Sites {
    let mut collector = SiteCollector::default();
    module.visit_with(&mut collector);
    collector.sites
}

#[derive(Default)]
struct SiteCollector {
    sites: Sites,
}

impl Visit for SiteCollector {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Some(init) = &node.init {
            let value = Value::of(init);
            if value.operand().literal != Literal::EmptyArray {
                self.sites.declarations.push(DeclarationSite {
                    span: node.span,
                    binding: Binding::of(&node.name),
                    value,
                });
            }
        }
        node.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, node: &ExportDefaultExpr) {
        let value = Value::of(&node.expr);
        if value.operand().literal != Literal::EmptyArray {
            self.sites.exports.push(ExportSite {
                span: node.span,
                value,
            });
        }
        node.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        self.call_args(node.span, false, &node.args);
        node.visit_children_with(self);
    }

    fn visit_opt_call(&mut self, node: &OptCall) {
        self.call_args(node.span, true, &node.args);
        node.visit_children_with(self);
    }
}

impl SiteCollector {
    fn call_args(&mut self, call: Span, optional: bool, args: &[ExprOrSpread]) {
        for (index, arg) in args.iter().enumerate() {
            if arg.spread.is_some() {
                continue;
            }
            let Some(cast) = argument_cast(&arg.expr) else {
                continue;
            };
            if cast.operand.literal != Literal::EmptyArray {
                self.sites.call_args.push(CallArgSite {
                    call,
                    optional,
                    index,
                    cast,
                });
            }
        }
    }
}

/// A cast argument, looking through one pair of parentheses.
fn argument_cast(expr: &Expr) -> Option<Cast> {
    match expr {
        Expr::Paren(paren) => Cast::of(&paren.expr),
        _ => Cast::of(expr),
    }
}
