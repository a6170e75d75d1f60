//! TypeScript parser adapter for tsat.
//!
//! Wraps the standard SWC parser. Besides the module itself, the parse
//! result keeps the original text and the source file's base position so
//! that AST spans can be mapped back to byte ranges of the input.

pub mod parse;

pub use parse::{parse_typescript, ParseResult};
