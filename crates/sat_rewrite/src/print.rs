//! Turning a rewritten module back into text.
//!
//! [`SourcePrinter`] splices the rewrites into the original source and
//! leaves every other byte alone. [`CodegenPrinter`] reprints the whole
//! mutated module with the SWC code generator.

use std::ops::Range;

use anyhow::Result;
use sat_ast::PrintMode;
use sat_parser::ParseResult;
use swc_ecma_codegen::{text_writer::JsWriter, Emitter, Node};

/// Replace `range` of the original source with `text`. An empty range is
/// an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Edit {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Edit::replace(at..at, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Edit::replace(range, "")
    }
}

pub trait Printer {
    /// Print `parsed.module`, whose rewrites are also described by `edits`.
    fn print(&self, parsed: &ParseResult, edits: &[Edit]) -> Result<String>;
}

pub fn printer_for(mode: PrintMode) -> Box<dyn Printer> {
    match mode {
        PrintMode::Preserve => Box::new(SourcePrinter),
        PrintMode::Reprint => Box::new(CodegenPrinter),
    }
}

pub struct SourcePrinter;

impl Printer for SourcePrinter {
    fn print(&self, parsed: &ParseResult, edits: &[Edit]) -> Result<String> {
        Ok(parsed.restore_bom(apply_edits(&parsed.source, edits)))
    }
}

/// Apply non-overlapping edits to `source`. An edit overlapping one that
/// starts earlier is dropped.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|edit| (edit.range.start, edit.range.end));

    let mut out = String::with_capacity(source.len() + edits.len() * 16);
    let mut cursor = 0;
    for edit in ordered {
        if edit.range.start < cursor || edit.range.end > source.len() {
            tracing::warn!(?edit.range, "dropping overlapping edit");
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

pub struct CodegenPrinter;

impl Printer for CodegenPrinter {
    fn print(&self, parsed: &ParseResult, _edits: &[Edit]) -> Result<String> {
        let mut buf = Vec::new();
        {
            let writer = JsWriter::new(parsed.source_map.clone(), "\n", &mut buf, None);
            let mut emitter = Emitter {
                cfg: swc_ecma_codegen::Config::default()
                    .with_target(swc_ecma_ast::EsVersion::latest()),
                cm: parsed.source_map.clone(),
                comments: Some(&parsed.comments),
                wr: writer,
            };
            parsed.module.emit_with(&mut emitter)?;
        }

        Ok(parsed.restore_bom(String::from_utf8(buf)?))
    }
}
