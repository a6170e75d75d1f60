use std::ops::Range;

use anyhow::{bail, Result};
use swc_common::{
    comments::SingleThreadedComments, errors::Handler, sync::Lrc, BytePos, FileName, SourceMap,
    Span,
};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{Syntax, TsSyntax};

const BOM: char = '\u{feff}';

/// Result of parsing a TypeScript source file.
pub struct ParseResult {
    pub module: swc_ecma_ast::Module,
    pub comments: SingleThreadedComments,
    pub source_map: Lrc<SourceMap>,
    /// The source text as given to the parser, without a leading byte order mark.
    pub source: String,
    /// Whether the input started with a UTF-8 byte order mark.
    pub bom: bool,
    /// Position of the first byte of `source` in `source_map`.
    pub start_pos: BytePos,
}

impl ParseResult {
    /// Byte offset into `source` of a position inside this file.
    pub fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.start_pos.0) as usize
    }

    /// Byte range of `span` within `source`.
    pub fn byte_range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }

    /// Source text covered by `span`, or `""` if the span does not belong to this file.
    pub fn text(&self, span: Span) -> &str {
        self.source.get(self.byte_range(span)).unwrap_or_default()
    }

    /// Put back the byte order mark stripped from the input, if any.
    pub fn restore_bom(&self, text: String) -> String {
        if self.bom {
            format!("{BOM}{text}")
        } else {
            text
        }
    }

    /// 1-based line number of `pos`.
    pub fn line(&self, pos: BytePos) -> usize {
        self.source_map.lookup_char_pos(pos).line
    }
}

/// Parse a TypeScript/TSX source string.
///
/// TSX is enabled when `filename` ends in `.tsx`. Fatal and recoverable
/// syntax errors are emitted to stderr and reported as an error; the
/// rewriter only ever sees modules that parsed cleanly.
///
/// A leading byte order mark is not part of `source` in the result, so that
/// spans and byte offsets agree.
pub fn parse_typescript(source: &str, filename: &str) -> Result<ParseResult> {
    let (bom, source) = match source.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, source),
    };
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let comments = SingleThreadedComments::default();

    let handler = Handler::with_emitter_writer(Box::new(std::io::stderr()), Some(source_map.clone()));

    let is_tsx = filename.ends_with(".tsx");
    let ts_syntax = Syntax::Typescript(TsSyntax {
        tsx: is_tsx,
        decorators: true,
        ..Default::default()
    });

    let mut recovered = vec![];
    let module = swc_ecma_parser::parse_file_as_module(
        &source_file,
        ts_syntax,
        EsVersion::latest(),
        Some(&comments),
        &mut recovered,
    )
    .map_err(|e| {
        e.into_diagnostic(&handler).emit();
        anyhow::anyhow!("failed to parse {filename}")
    })?;

    if !recovered.is_empty() {
        let count = recovered.len();
        for e in recovered {
            e.into_diagnostic(&handler).emit();
        }
        bail!("failed to parse {filename}: {count} syntax error(s)");
    }

    tracing::trace!(filename, items = module.body.len(), "parsed module");

    Ok(ParseResult {
        module,
        comments,
        source_map,
        source: source.to_string(),
        bom,
        start_pos: source_file.start_pos,
    })
}
