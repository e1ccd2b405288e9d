//! Source files laid out in one global position space.
//!
//! Each added file gets a base offset past the end of the previous one, so
//! a [`Span`] is enough to find the file it belongs to.

use std::fmt;
use std::sync::Arc;

use crate::span::{BytePos, Span};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// 1-indexed line and column (column counted in bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone)]
pub struct SourceFile {
    id: FileId,
    name: Arc<str>,
    source: Arc<str>,
    base: u32,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(id: FileId, name: Arc<str>, source: Arc<str>, base: u32) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            id,
            name,
            source,
            base,
            line_starts,
        }
    }

    #[inline]
    pub const fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub const fn base(&self) -> u32 {
        self.base
    }

    #[inline]
    pub fn end_pos(&self) -> u32 {
        self.base + self.source.len() as u32
    }

    /// Converts a global position into an offset inside this file.
    #[inline]
    pub fn local_offset(&self, pos: BytePos) -> u32 {
        pos.0.saturating_sub(self.base)
    }

    pub fn line_col(&self, pos: BytePos) -> LineCol {
        let offset = self.local_offset(pos);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        LineCol {
            line: line as u32 + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }

    pub fn span_text(&self, span: Span) -> &str {
        let start = self.local_offset(span.start) as usize;
        let end = (self.local_offset(span.end) as usize).min(self.source.len());
        self.source.get(start..end).unwrap_or("")
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base", &self.base)
            .finish()
    }
}

/// All source files known to a session.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    next_base: u32,
}

impl SourceMap {
    pub fn new() -> Self {
        // Position 0 is reserved for dummy spans.
        Self {
            files: Vec::new(),
            next_base: 1,
        }
    }

    pub fn add_file(&mut self, name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> FileId {
        let id = FileId(self.files.len() as u32);
        let file = SourceFile::new(id, name.into(), source.into(), self.next_base);
        self.next_base = file.end_pos() + 1;
        self.files.push(file);
        id
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    /// Finds the file containing the start of `span`.
    pub fn lookup_span(&self, span: Span) -> Option<&SourceFile> {
        let pos = span.start.0;
        let idx = self.files.partition_point(|f| f.base <= pos);
        let file = self.files.get(idx.checked_sub(1)?)?;
        (pos <= file.end_pos()).then_some(file)
    }

    pub fn line_col(&self, pos: BytePos) -> Option<LineCol> {
        self.lookup_span(Span::new(pos, pos)).map(|f| f.line_col(pos))
    }

    /// Formats a position as `file:line:col`, or `-` when unknown.
    pub fn format_pos(&self, pos: BytePos) -> String {
        match self.lookup_span(Span::new(pos, pos)) {
            Some(file) => format!("{}:{}", file.name(), file.line_col(pos)),
            None => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_get_disjoint_bases() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.go", "package a\n");
        let b = map.add_file("b.go", "package b\nfunc f() {}\n");
        let fa = map.file(a).unwrap();
        let fb = map.file(b).unwrap();
        assert!(fa.end_pos() < fb.base());
        let span = Span::from_u32(fb.base() + 8, fb.base() + 9);
        assert_eq!(map.lookup_span(span).unwrap().id(), b);
        assert_eq!(map.file(b).unwrap().span_text(span), "b");
    }

    #[test]
    fn test_line_col() {
        let mut map = SourceMap::new();
        let id = map.add_file("x.go", "package x\n\nfunc f() {}\n");
        let base = map.file(id).unwrap().base();
        let lc = map.line_col(BytePos(base + 11)).unwrap();
        assert_eq!((lc.line, lc.column), (3, 1));
        assert_eq!(map.format_pos(BytePos(base + 16)), "x.go:3:6");
    }

    #[test]
    fn test_dummy_position_is_unmapped() {
        let mut map = SourceMap::new();
        map.add_file("x.go", "package x");
        assert!(map.lookup_span(Span::dummy()).is_none());
        assert_eq!(map.format_pos(BytePos(0)), "-");
    }
}
