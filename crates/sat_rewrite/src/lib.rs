//! Rewrites type-asserted and type-annotated literals into `satisfies` expressions.
//!
//! Transforms:
//! - `const a: T = { ... }`   → `const a = { ... } satisfies T`
//! - `const a = { ... } as T` → `const a = { ... } satisfies T`
//! - `export default <T>[x]`  → `export default [x] satisfies T`
//! - `f({ ... } as T)`        → `f({ ... } satisfies T)`
//!
//! Only object literals and non-empty array literals are rewritten, and only
//! against named types (optionally generic, as arrays, or in unions and
//! intersections). `any` and `as const` are never touched.

pub mod collect;
pub mod eligible;
pub mod print;
pub mod rewrite;
pub mod shape;
pub mod transform;

pub use transform::{transform, transform_file, RewriteReport, TransformOutput};
