use super::scanner::{FoldedDocument, ScanError};
use crate::config::ScanConfig;
use crate::document::PositionService;
use crate::models::{FoldType, RenderedFile};
use crate::parsers::FoldParserRegistry;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// A collapsed fold as it appears on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    fold_type: FoldType,
    hidden: usize,
}

/// Prints a document the way an editor shows it: lines inside collapsed
/// folds are dropped and the first line of each collapsed fold gets a
/// placeholder.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    line_numbers: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix each shown line with its document line number
    pub fn with_line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    /// Render without colors
    pub fn render(&self, folded: &FoldedDocument) -> io::Result<String> {
        let mut buffer = Buffer::no_color();
        self.render_to(folded, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer.into_inner()).into_owned())
    }

    /// Render with ANSI escape codes around placeholders and line numbers
    pub fn render_ansi(&self, folded: &FoldedDocument) -> io::Result<String> {
        let mut buffer = Buffer::ansi();
        self.render_to(folded, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer.into_inner()).into_owned())
    }

    pub fn render_to<W: WriteColor>(
        &self,
        folded: &FoldedDocument,
        out: &mut W,
    ) -> io::Result<()> {
        let FoldedDocument { document, manager } = folded;
        let placeholders = Self::placeholders(folded);
        let line_count = document.line_count();
        let width = line_count.to_string().len();

        let mut first = true;
        for line in 0..line_count {
            if manager.is_line_hidden(line, document) {
                continue;
            }
            if !first {
                writeln!(out)?;
            }
            first = false;

            if self.line_numbers {
                out.set_color(ColorSpec::new().set_dimmed(true))?;
                write!(out, "{:>width$} ", line + 1, width = width)?;
                out.reset()?;
            }
            let text = document.line_text(line).unwrap_or_default();
            write!(out, "{}", text)?;

            if let Some(placeholder) = placeholders.get(&line) {
                out.set_color(
                    ColorSpec::new()
                        .set_fg(Some(Self::fold_color(placeholder.fold_type)))
                        .set_dimmed(true),
                )?;
                write!(out, " ... ({} lines)", placeholder.hidden)?;
                out.reset()?;
            }
        }
        Ok(())
    }

    /// Placeholder per start line of each outermost collapsed fold
    fn placeholders(folded: &FoldedDocument) -> BTreeMap<usize, Placeholder> {
        let FoldedDocument { document, manager } = folded;
        let forest = manager.forest();
        let mut placeholders = BTreeMap::new();
        let mut pending: Vec<_> = forest.roots().iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            let fold = &forest[id];
            if fold.is_collapsed() {
                placeholders
                    .entry(fold.start_line(document))
                    .or_insert(Placeholder {
                        fold_type: fold.fold_type(),
                        hidden: fold.line_count(document),
                    });
            } else {
                pending.extend(fold.children().iter().rev().copied());
            }
        }
        placeholders
    }

    fn fold_color(fold_type: FoldType) -> Color {
        match fold_type {
            FoldType::Code => Color::Blue,
            FoldType::Comment => Color::Green,
            FoldType::Imports => Color::Yellow,
            FoldType::UserDefined(_) => Color::Magenta,
        }
    }
}

/// Render a file with the configured fold types collapsed
pub fn render_file(path: &Path, config: &ScanConfig) -> Result<RenderedFile, ScanError> {
    render_file_with(path, config, |renderer, folded| renderer.render(folded))
}

/// Render a file with ANSI colors
pub fn render_file_ansi(path: &Path, config: &ScanConfig) -> Result<RenderedFile, ScanError> {
    render_file_with(path, config, |renderer, folded| renderer.render_ansi(folded))
}

fn render_file_with(
    path: &Path,
    config: &ScanConfig,
    render: impl Fn(&Renderer, &FoldedDocument) -> io::Result<String>,
) -> Result<RenderedFile, ScanError> {
    let language = config
        .language_for_path(path)
        .ok_or_else(|| ScanError::UnsupportedFile(path.to_path_buf()))?;
    let content = fs::read_to_string(path)?;

    let registry = Arc::new(FoldParserRegistry::with_builtins());
    let folded = FoldedDocument::open(&content, language, registry, config)?;
    let renderer = Renderer::new().with_line_numbers(config.line_numbers);
    let content = render(&renderer, &folded)?;

    Ok(RenderedFile {
        path: path.to_path_buf(),
        content,
        fold_count: folded.manager.forest().len(),
        lines_hidden: folded.manager.hidden_line_count(&folded.document),
    })
}
