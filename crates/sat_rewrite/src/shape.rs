//! Classification of type annotations into the shapes the rewriter accepts.
//!
//! Only named references are worth a `satisfies` check: `Foo`, `Meta<Foo>`,
//! `Foo[]`, and unions or intersections built from those. Keyword types
//! (`any` included), literal types, qualified names and anything nested
//! more deeply classify as [`TypeShape::Other`].

use swc_ecma_ast::{TsEntityName, TsType, TsTypeRef, TsUnionOrIntersectionType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// `Foo` or `Foo<Bar>`.
    Reference { name: String, generic: bool },
    /// `Foo[]`.
    ArrayOf { name: String },
    /// `A | B[]`, named members only.
    Union(Vec<String>),
    /// `A & B`, named members only.
    Intersection(Vec<String>),
    Other,
}

impl TypeShape {
    pub fn is_valid(&self) -> bool {
        !matches!(self, TypeShape::Other)
    }

    /// Names a type-name restriction is matched against.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            TypeShape::Reference { name, .. } | TypeShape::ArrayOf { name } => {
                std::slice::from_ref(name)
            }
            TypeShape::Union(names) | TypeShape::Intersection(names) => names,
            TypeShape::Other => &[],
        };
        names.iter().map(String::as_str)
    }
}

/// Classify a type annotation.
pub fn classify(ty: &TsType) -> TypeShape {
    match ty {
        TsType::TsTypeRef(reference) => match reference_name(reference) {
            Some(name) => TypeShape::Reference {
                name: name.to_string(),
                generic: reference.type_params.is_some(),
            },
            None => TypeShape::Other,
        },
        TsType::TsArrayType(array) => match classify(&array.elem_type) {
            TypeShape::Reference { name, .. } => TypeShape::ArrayOf { name },
            _ => TypeShape::Other,
        },
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
            member_names(&union.types).map_or(TypeShape::Other, TypeShape::Union)
        }
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
            intersection,
        )) => member_names(&intersection.types).map_or(TypeShape::Other, TypeShape::Intersection),
        _ => TypeShape::Other,
    }
}

/// The plain identifier a reference names. `const` is the const-assertion
/// keyword, not a type.
fn reference_name(reference: &TsTypeRef) -> Option<&str> {
    match &reference.type_name {
        TsEntityName::Ident(ident) if &*ident.sym != "const" => Some(&*ident.sym),
        _ => None,
    }
}

fn member_names(types: &[Box<TsType>]) -> Option<Vec<String>> {
    types
        .iter()
        .map(|member| match classify(member) {
            TypeShape::Reference { name, .. } | TypeShape::ArrayOf { name } => Some(name),
            _ => None,
        })
        .collect()
}
