mod json;
mod yaml;

pub use json::{to_json, to_json_compact};
pub use yaml::to_yaml;

use crate::models::{FoldMap, FoldOutline, FoldStats, GroupedFoldMap, ScanMetadata, SourceFile};
use std::io;
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Summary,
    Ansi,
}

/// Format a FoldMap according to the specified format (flat structure)
pub fn format_output(fold_map: &FoldMap, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => to_json(fold_map),
        OutputFormat::Yaml => to_yaml(fold_map),
        OutputFormat::Summary | OutputFormat::Ansi => {
            write_text(format, |out| write_summary(fold_map, out))
        }
    }
}

/// Format a FoldMap with one section per language
pub fn format_output_grouped(
    fold_map: &FoldMap,
    format: OutputFormat,
) -> Result<String, FormatError> {
    let grouped = fold_map.to_grouped();
    match format {
        OutputFormat::Json => to_json(&grouped),
        OutputFormat::Yaml => to_yaml(&grouped),
        OutputFormat::Summary | OutputFormat::Ansi => {
            write_text(format, |out| write_summary_grouped(&grouped, out))
        }
    }
}

/// Format the folds of a single file
pub fn format_file(file: &SourceFile, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => to_json(file),
        OutputFormat::Yaml => to_yaml(file),
        OutputFormat::Summary | OutputFormat::Ansi => {
            write_text(format, |out| write_file_listing(file, out))
        }
    }
}

/// Generate a human-readable summary
pub fn format_summary(fold_map: &FoldMap) -> Result<String, FormatError> {
    format_output(fold_map, OutputFormat::Summary)
}

fn write_text(
    format: OutputFormat,
    write: impl FnOnce(&mut Buffer) -> io::Result<()>,
) -> Result<String, FormatError> {
    let mut buffer = if format == OutputFormat::Ansi {
        Buffer::ansi()
    } else {
        Buffer::no_color()
    };
    write(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer.into_inner()).into_owned())
}

fn heading<W: WriteColor>(out: &mut W, text: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true).set_fg(Some(color)))?;
    writeln!(out, "{}", text)?;
    out.reset()
}

fn label<W: WriteColor>(out: &mut W, name: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_dimmed(true))?;
    write!(out, "{}:", name)?;
    out.reset()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

fn write_stats<W: WriteColor>(out: &mut W, stats: &FoldStats) -> io::Result<()> {
    label(out, "Files")?;
    write!(out, " {} | ", stats.total_files)?;
    label(out, "Lines")?;
    write!(out, " {} | ", stats.total_lines)?;
    label(out, "Foldable")?;
    write!(
        out,
        " {} ({:.1}%) | ",
        stats.foldable_lines,
        percent(stats.foldable_lines, stats.total_lines)
    )?;
    label(out, "Hidden")?;
    writeln!(out, " {}", stats.hidden_lines)?;

    label(out, "Folds")?;
    writeln!(
        out,
        " {} (code: {}, comments: {}, imports: {}, user: {}) | max depth {}",
        stats.total_folds,
        stats.code_folds,
        stats.comment_folds,
        stats.import_folds,
        stats.user_folds,
        stats.max_depth
    )
}

fn write_metadata<W: WriteColor>(out: &mut W, metadata: &ScanMetadata) -> io::Result<()> {
    label(out, "Scan Duration")?;
    writeln!(
        out,
        " {}ms ({:.2} files/sec)",
        metadata.scan_duration_ms, metadata.files_per_second
    )?;
    label(out, "Timestamp")?;
    writeln!(out, " {}", metadata.timestamp)?;
    label(out, "Tool Version")?;
    writeln!(out, " {}", metadata.tool_version)
}

fn write_summary<W: WriteColor>(fold_map: &FoldMap, out: &mut W) -> io::Result<()> {
    heading(out, "Fold Analysis Summary", Color::Cyan)?;
    writeln!(out, "=====================")?;
    label(out, "Root")?;
    writeln!(out, " {}\n", fold_map.root.display())?;

    write_stats(out, &fold_map.stats)?;
    for (language, count) in &fold_map.stats.files_by_language {
        writeln!(out, "  - {}: {}", language, count)?;
    }
    writeln!(out)?;

    write_metadata(out, &fold_map.metadata)
}

fn write_summary_grouped<W: WriteColor>(grouped: &GroupedFoldMap, out: &mut W) -> io::Result<()> {
    heading(out, "Fold Analysis Summary (Grouped)", Color::Cyan)?;
    writeln!(out, "===============================")?;
    label(out, "Root")?;
    writeln!(out, " {}\n", grouped.root.display())?;

    for (language, section) in &grouped.languages {
        heading(out, &format!("## {}", language), Color::Green)?;
        write_stats(out, &section.stats)?;

        let mut files_by_folds: Vec<&SourceFile> = section
            .files
            .iter()
            .filter(|f| !f.folds.is_empty())
            .collect();
        files_by_folds.sort_by(|a, b| b.fold_count().cmp(&a.fold_count()));

        if !files_by_folds.is_empty() {
            label(out, "Top files by folds")?;
            writeln!(out)?;
            for file in files_by_folds.iter().take(5) {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                write!(out, "  {}", file.path.display())?;
                out.reset()?;
                writeln!(
                    out,
                    " ({} folds, {} lines)",
                    file.fold_count(),
                    file.line_count
                )?;
            }
        }
        writeln!(out)?;
    }

    write_metadata(out, &grouped.metadata)
}

fn write_file_listing<W: WriteColor>(file: &SourceFile, out: &mut W) -> io::Result<()> {
    label(out, "File")?;
    writeln!(out, " {}", file.path.display())?;
    label(out, "Language")?;
    writeln!(out, " {}", file.language.as_str())?;
    label(out, "Line Count")?;
    writeln!(out, " {}", file.line_count)?;
    label(out, "Folds")?;
    writeln!(out, " {} ({} lines hidden)", file.fold_count(), file.hidden_lines)?;
    if let Some(error) = &file.error {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(out, "Error: {}", error)?;
        out.reset()?;
    }
    writeln!(out)?;

    let mut index = 0;
    for root in &file.folds {
        write_fold(out, root, 0, &mut index)?;
    }
    Ok(())
}

fn write_fold<W: WriteColor>(
    out: &mut W,
    fold: &FoldOutline,
    depth: usize,
    index: &mut usize,
) -> io::Result<()> {
    *index += 1;
    write!(out, "{:indent$}{}. ", "", index, indent = depth * 2)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)))?;
    write!(out, "{}", fold.fold_type)?;
    out.reset()?;
    write!(
        out,
        " (lines {}-{}, {} lines)",
        fold.start_line, fold.end_line, fold.line_count
    )?;
    if fold.end_offset.is_none() {
        write!(out, " [unterminated]")?;
    }
    if fold.collapsed {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(out, " [collapsed]")?;
        out.reset()?;
    }
    writeln!(out)?;

    for child in &fold.children {
        write_fold(out, child, depth + 1, index)?;
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
