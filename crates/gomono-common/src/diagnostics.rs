//! Diagnostics: collected while checking, rendered with codespan-reporting.

use std::fmt;

use codespan_reporting::diagnostic::{
    Diagnostic as CSDiagnostic, Label as CSLabel, LabelStyle, Severity as CSSeverity,
};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{
    self,
    termcolor::{self, ColorChoice, StandardStream, WriteColor},
    Config,
};

use crate::source::SourceMap;
use crate::span::Span;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

impl From<Severity> for CSSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => CSSeverity::Error,
            Severity::Warning => CSSeverity::Warning,
            Severity::Note => CSSeverity::Note,
        }
    }
}

/// A source location attached to a diagnostic.
#[derive(Clone, Debug)]
pub struct Label {
    pub style: LabelStyle,
    pub span: Span,
    pub message: Option<String>,
}

impl Label {
    pub fn primary(span: impl Into<Span>) -> Self {
        Self {
            style: LabelStyle::Primary,
            span: span.into(),
            message: None,
        }
    }

    pub fn secondary(span: impl Into<Span>) -> Self {
        Self {
            style: LabelStyle::Secondary,
            span: span.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A single reported problem.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Numeric error code, rendered as `E2100`.
    pub code: Option<u16>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    #[inline]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.style == LabelStyle::Primary)
            .map(|l| l.span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[E{:04}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Accumulates diagnostics for one session.
#[derive(Clone, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    #[inline]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.error_count += other.error_count;
        self.diagnostics.extend(other.diagnostics);
    }
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("count", &self.diagnostics.len())
            .field("errors", &self.error_count)
            .finish()
    }
}

/// Renders diagnostics against a [`SourceMap`].
pub struct DiagnosticEmitter<'a> {
    source_map: &'a SourceMap,
    config: Config,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(source_map: &'a SourceMap) -> Self {
        Self {
            source_map,
            config: Config::default(),
        }
    }

    /// Writes to stderr with colors when the terminal supports them.
    pub fn emit(&self, diagnostic: &Diagnostic) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer.lock(), diagnostic);
    }

    pub fn emit_to<W: WriteColor>(&self, writer: &mut W, diagnostic: &Diagnostic) {
        let files = self.build_files();
        let cs_diagnostic = self.to_codespan(diagnostic);
        if let Err(err) = term::emit(writer, &self.config, &files, &cs_diagnostic) {
            log::error!("failed to render diagnostic `{}`: {}", diagnostic, err);
        }
    }

    pub fn emit_to_string(&self, diagnostic: &Diagnostic) -> String {
        let mut buffer = termcolor::Buffer::no_color();
        self.emit_to(&mut buffer, diagnostic);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    pub fn emit_all(&self, sink: &DiagnosticSink) {
        for diagnostic in sink.iter() {
            self.emit(diagnostic);
        }
    }

    pub fn emit_all_to_string(&self, sink: &DiagnosticSink) -> String {
        sink.iter().map(|d| self.emit_to_string(d)).collect()
    }

    fn build_files(&self) -> SimpleFiles<&str, &str> {
        let mut files = SimpleFiles::new();
        for file in self.source_map.files() {
            files.add(file.name(), file.source());
        }
        files
    }

    fn to_codespan(&self, diagnostic: &Diagnostic) -> CSDiagnostic<usize> {
        let mut cs_diagnostic =
            CSDiagnostic::new(diagnostic.severity.into()).with_message(&diagnostic.message);
        if let Some(code) = diagnostic.code {
            cs_diagnostic = cs_diagnostic.with_code(format!("E{:04}", code));
        }
        // Labels on synthesized nodes have no file and are dropped.
        let labels = diagnostic
            .labels
            .iter()
            .filter_map(|label| {
                let file = self.source_map.lookup_span(label.span)?;
                let start = file.local_offset(label.span.start) as usize;
                let end = file.local_offset(label.span.end) as usize;
                let mut cs_label = CSLabel::new(label.style, file.id().as_u32() as usize, start..end);
                if let Some(msg) = &label.message {
                    cs_label = cs_label.with_message(msg);
                }
                Some(cs_label)
            })
            .collect();
        cs_diagnostic
            .with_labels(labels)
            .with_notes(diagnostic.notes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_counts_errors_only() {
        let mut sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("boom"));
        sink.emit(Diagnostic::warning("hmm"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.error_count(), 1);
        assert!(sink.has_errors());
        let taken = sink.take();
        assert_eq!(taken.len(), 2);
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_display_includes_code() {
        let d = Diagnostic::error("cannot infer T").with_code(2101);
        assert_eq!(d.to_string(), "error[E2101]: cannot infer T");
    }

    #[test]
    fn test_emit_to_string_renders_label() {
        let mut map = SourceMap::new();
        let id = map.add_file("main.go", "package main\nvar x = f(1, \"a\")\n");
        let base = map.file(id).unwrap().base();
        let diag = Diagnostic::error("type string of \"a\" does not match inferred type int for T")
            .with_code(2102)
            .with_label(Label::primary(Span::from_u32(base + 26, base + 29)).with_message("here"));
        let out = DiagnosticEmitter::new(&map).emit_to_string(&diag);
        assert!(out.contains("E2102"), "{}", out);
        assert!(out.contains("main.go"), "{}", out);
        assert!(out.contains("here"), "{}", out);
    }

    #[test]
    fn test_primary_span() {
        let d = Diagnostic::error("x")
            .with_label(Label::secondary(Span::from_u32(1, 2)))
            .with_label(Label::primary(Span::from_u32(5, 9)));
        assert_eq!(d.primary_span(), Some(Span::from_u32(5, 9)));
    }
}
