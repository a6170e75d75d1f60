//! Planning and applying `satisfies` rewrites.
//!
//! Rewrites are planned in three passes over the collected sites (casts in
//! declarators and default exports, annotated declarators, cast call
//! arguments). Every plan is computed before the module is touched; each
//! plan then mutates the module in place and carries the equivalent text
//! edits for the source printer.

use std::collections::HashMap;
use std::ops::Range;

use sat_ast::{ExpressionKind, Options};
use sat_parser::ParseResult;
use swc_common::{util::take::Take, BytePos, Span, Spanned};
use swc_ecma_ast::{
    CallExpr, ExportDefaultExpr, Expr, ExprOrSpread, Module, OptCall, Pat, TsAsExpr,
    TsSatisfiesExpr, TsTypeAnn, TsTypeAssertion, VarDeclarator,
};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::collect::{
    Annotation, BindingKind, Cast, CastStyle, Literal, SiteAddr, Sites, TypeInfo, Value,
};
use crate::eligible::{eligible, Verdict};
use crate::print::Edit;

/// One accepted site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub addr: SiteAddr,
    pub kind: ExpressionKind,
    /// Where the rewritten expression starts.
    pub pos: BytePos,
    /// Source text of the type the expression now satisfies.
    pub type_text: String,
    pub edits: Vec<Edit>,
}

/// Plans rewrites against one parsed file.
pub struct Planner<'a> {
    parsed: &'a ParseResult,
    options: &'a Options,
}

impl<'a> Planner<'a> {
    pub fn new(parsed: &'a ParseResult, options: &'a Options) -> Self {
        Self { parsed, options }
    }

    /// Run all three passes, in order.
    pub fn plan(&self, sites: &Sites) -> Vec<Rewrite> {
        let mut plans = self.plan_casts(sites);
        plans.extend(self.plan_declarations(sites));
        plans.extend(self.plan_call_args(sites));
        plans
    }

    /// Declarators and default exports whose value is a cast.
    pub fn plan_casts(&self, sites: &Sites) -> Vec<Rewrite> {
        let declarators = sites.declarations.iter().filter_map(|site| match &site.value {
            Value::Cast(cast) => Some((
                SiteAddr::Declarator(site.span),
                cast,
                site.binding.annotation.as_ref(),
            )),
            Value::Plain(_) => None,
        });
        let exports = sites.exports.iter().filter_map(|site| match &site.value {
            Value::Cast(cast) => Some((SiteAddr::ExportDefault(site.span), cast, None)),
            Value::Plain(_) => None,
        });

        declarators
            .chain(exports)
            .filter_map(|(addr, cast, annotation)| {
                let mut rewrite = self.rewrite_cast(addr, cast)?;
                if let Some(annotation) = annotation {
                    rewrite.edits.push(self.remove(annotation));
                }
                Some(rewrite)
            })
            .collect()
    }

    /// `const a: T = <literal>` with a plain identifier binding.
    pub fn plan_declarations(&self, sites: &Sites) -> Vec<Rewrite> {
        sites
            .declarations
            .iter()
            .filter(|site| site.binding.kind == BindingKind::Identifier)
            .filter_map(|site| {
                let annotation = site.binding.annotation.as_ref()?;
                let Value::Plain(operand) = site.value else {
                    return None;
                };
                let addr = SiteAddr::Declarator(site.span);
                let kind = ExpressionKind::Declaration;
                if !self.accept(addr, operand.literal, &annotation.ty, kind) {
                    return None;
                }
                let type_text = self.text(annotation.ty.span);
                Some(Rewrite {
                    addr,
                    kind,
                    pos: operand.span.lo,
                    edits: vec![
                        self.remove(annotation),
                        Edit::insert(
                            self.parsed.offset(operand.span.hi),
                            format!(" satisfies {type_text}"),
                        ),
                    ],
                    type_text,
                })
            })
            .collect()
    }

    /// Cast arguments of call expressions.
    pub fn plan_call_args(&self, sites: &Sites) -> Vec<Rewrite> {
        sites
            .call_args
            .iter()
            .filter_map(|site| self.rewrite_cast(site.addr(), &site.cast))
            .collect()
    }

    fn rewrite_cast(&self, addr: SiteAddr, cast: &Cast) -> Option<Rewrite> {
        if !self.accept(addr, cast.operand.literal, &cast.ty, ExpressionKind::Cast) {
            return None;
        }
        let type_text = self.text(cast.ty.span);
        let edits = match cast.style {
            CastStyle::As => vec![self.as_keyword(cast)],
            CastStyle::AngleBracket => {
                vec![
                    Edit::delete(self.angle_prefix(cast)),
                    Edit::insert(
                        self.parsed.offset(cast.operand.span.hi),
                        format!(" satisfies {type_text}"),
                    ),
                ]
            }
        };
        Some(Rewrite {
            addr,
            kind: ExpressionKind::Cast,
            pos: cast.operand.span.lo,
            type_text,
            edits,
        })
    }

    fn accept(
        &self,
        addr: SiteAddr,
        literal: Literal,
        ty: &TypeInfo,
        kind: ExpressionKind,
    ) -> bool {
        match eligible(literal, &ty.shape, kind, self.options) {
            Verdict::Eligible => true,
            Verdict::Skip(reason) => {
                tracing::debug!(
                    ?addr,
                    %kind,
                    ty = %self.parsed.text(ty.span),
                    %reason,
                    "skipping site"
                );
                false
            }
        }
    }

    /// Replace the `as` keyword between operand and type with `satisfies`.
    /// Comments around the keyword are kept.
    fn as_keyword(&self, cast: &Cast) -> Edit {
        let gap = self.parsed.offset(cast.operand.span.hi)..self.parsed.offset(cast.ty.span.lo);
        let text = self.parsed.source.get(gap.clone()).unwrap_or_default();
        let lead = skip_trivia(text);
        if text[lead..].starts_with("as") {
            let start = gap.start + lead;
            Edit::replace(start..start + 2, "satisfies")
        } else {
            tracing::warn!(?gap, "no `as` keyword before cast type");
            Edit::replace(gap, " satisfies ")
        }
    }

    /// `<T>` of an angle-bracket cast, with the whitespace up to the operand.
    /// Comments between `>` and the operand stay.
    fn angle_prefix(&self, cast: &Cast) -> Range<usize> {
        let start = self.parsed.offset(cast.span.lo);
        let after_type = self.parsed.offset(cast.ty.span.hi);
        let operand = self.parsed.offset(cast.operand.span.lo);
        let gap = self.parsed.source.get(after_type..operand).unwrap_or_default();
        let close = skip_trivia(gap);
        if !gap[close..].starts_with('>') {
            return start..operand;
        }
        let rest = &gap[close + 1..];
        let end = after_type + close + 1 + (rest.len() - rest.trim_start().len());
        start..end
    }

    fn remove(&self, annotation: &Annotation) -> Edit {
        Edit::delete(self.parsed.byte_range(annotation.removal))
    }

    fn text(&self, span: Span) -> String {
        self.parsed.text(span).to_string()
    }
}

/// Apply planned rewrites to the module in place.
pub fn apply(module: &mut Module, plans: &[Rewrite]) {
    let mut rewriter = SatisfiesRewriter {
        targets: plans.iter().map(|plan| (plan.addr, plan.kind)).collect(),
    };
    module.visit_mut_with(&mut rewriter);
}

/// Rewrites the nodes at the planned addresses.
struct SatisfiesRewriter {
    targets: HashMap<SiteAddr, ExpressionKind>,
}

impl VisitMut for SatisfiesRewriter {
    fn visit_mut_var_declarator(&mut self, node: &mut VarDeclarator) {
        node.visit_mut_children_with(self);

        let Some(kind) = self.targets.get(&SiteAddr::Declarator(node.span)).copied() else {
            return;
        };
        let Some(init) = node.init.as_mut() else {
            return;
        };

        match kind {
            ExpressionKind::Cast => {
                if cast_to_satisfies(init) {
                    take_annotation(&mut node.name);
                }
            }
            ExpressionKind::Declaration => {
                if let Some(ann) = take_annotation(&mut node.name) {
                    let expr = init.take();
                    *init = Box::new(Expr::TsSatisfies(TsSatisfiesExpr {
                        span: expr.span(),
                        expr,
                        type_ann: ann.type_ann,
                    }));
                }
            }
        }
    }

    fn visit_mut_export_default_expr(&mut self, node: &mut ExportDefaultExpr) {
        node.visit_mut_children_with(self);

        if self.targets.contains_key(&SiteAddr::ExportDefault(node.span)) {
            cast_to_satisfies(&mut node.expr);
        }
    }

    fn visit_mut_call_expr(&mut self, node: &mut CallExpr) {
        node.visit_mut_children_with(self);

        let call = node.span;
        self.call_args(&mut node.args, |index| SiteAddr::CallArg { call, index });
    }

    fn visit_mut_opt_call(&mut self, node: &mut OptCall) {
        node.visit_mut_children_with(self);

        let call = node.span;
        self.call_args(&mut node.args, |index| SiteAddr::OptCallArg { call, index });
    }
}

impl SatisfiesRewriter {
    fn call_args(&self, args: &mut [ExprOrSpread], addr: impl Fn(usize) -> SiteAddr) {
        for (index, arg) in args.iter_mut().enumerate() {
            if !self.targets.contains_key(&addr(index)) || cast_to_satisfies(&mut arg.expr) {
                continue;
            }
            if let Expr::Paren(paren) = &mut *arg.expr {
                cast_to_satisfies(&mut paren.expr);
            }
        }
    }
}

/// Turn `expr as T` or `<T>expr` into `expr satisfies T`. Returns false,
/// leaving the node alone, for anything else.
fn cast_to_satisfies(expr: &mut Box<Expr>) -> bool {
    if !matches!(**expr, Expr::TsAs(_) | Expr::TsTypeAssertion(_)) {
        return false;
    }
    let satisfies = match *expr.take() {
        Expr::TsAs(TsAsExpr {
            span,
            expr: inner,
            type_ann,
            ..
        })
        | Expr::TsTypeAssertion(TsTypeAssertion {
            span,
            expr: inner,
            type_ann,
            ..
        }) => TsSatisfiesExpr {
            span,
            expr: inner,
            type_ann,
        },
        other => {
            *expr = Box::new(other);
            return false;
        }
    };
    **expr = Expr::TsSatisfies(satisfies);
    true
}

/// Length of the whitespace and comments at the start of `text`.
fn skip_trivia(text: &str) -> usize {
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start();
        if let Some(comment) = trimmed.strip_prefix("/*") {
            match comment.find("*/") {
                Some(end) => rest = &comment[end + 2..],
                None => return text.len(),
            }
        } else if let Some(comment) = trimmed.strip_prefix("//") {
            match comment.find('\n') {
                Some(end) => rest = &comment[end..],
                None => return text.len(),
            }
        } else {
            return text.len() - trimmed.len();
        }
    }
}

fn take_annotation(pat: &mut Pat) -> Option<Box<TsTypeAnn>> {
    match pat {
        Pat::Ident(ident) => ident.type_ann.take(),
        Pat::Object(object) => object.type_ann.take(),
        Pat::Array(array) => array.type_ann.take(),
        _ => None,
    }
}
