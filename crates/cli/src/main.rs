use anyhow::{anyhow, Context};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use foldline_core::{
    format_file, format_output, format_output_grouped, render_file, render_file_ansi, FoldConfig,
    FoldScanner, FoldType, Language, OutputFormat, ScanConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "foldline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "List, collapse and render code folds")]
#[command(long_about = "Finds the foldable regions of source files the way an editor gutter does: \
    brace and bracket blocks, tag blocks, LaTeX environments, NSIS sections, multi-line \
    comments and Java import groups.\n\n\
    Settings are read from foldline.toml in the working directory (or --config) and can be \
    overridden on the command line.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./foldline.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colors in terminal output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a project and show fold statistics
    Analyze {
        /// Project root directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Ansi)]
        format: OutputFormatArg,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use flat output structure (not grouped by language)
        #[arg(long)]
        flat: bool,

        /// Only scan these languages (name, id or extension; repeatable)
        #[arg(long = "only", action = clap::ArgAction::Append)]
        only: Vec<String>,

        /// Additional ignore patterns (glob style)
        #[arg(long, action = clap::ArgAction::Append)]
        ignore: Vec<String>,

        /// Ignore file path (defaults to .gitignore)
        #[arg(long)]
        ignore_file: Option<PathBuf>,

        /// Include vendored and build output directories
        #[arg(long)]
        include_deps: bool,

        /// Parallel threads (0 = auto)
        #[arg(long, default_value_t = 0)]
        threads: usize,

        #[command(flatten)]
        folding: FoldingArgs,
    },

    /// Render a single file with collapsed folds hidden
    Render {
        /// File to render
        file: PathBuf,

        /// Output with ANSI colors
        #[arg(long)]
        ansi: bool,

        /// Prefix lines with line numbers
        #[arg(short = 'n', long)]
        line_numbers: bool,

        #[command(flatten)]
        folding: FoldingArgs,
    },

    /// List all foldable regions in a file
    List {
        /// File to analyze
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormatArg::Summary)]
        format: OutputFormatArg,

        #[command(flatten)]
        folding: FoldingArgs,
    },
}

/// Options shared by every command
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct FoldingArgs {
    /// Parse files as this language (name, id or extension)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Fold types collapsed on open (comma-separated: code,comment,imports or a
    /// user-defined number; "none" expands everything)
    #[arg(long)]
    pub collapse: Option<String>,

    /// Turn folding off
    #[arg(long)]
    pub disable: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Summary,
    Ansi,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
            OutputFormatArg::Summary => OutputFormat::Summary,
            OutputFormatArg::Ansi => OutputFormat::Ansi,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);

    match &args.command {
        Commands::Analyze {
            path,
            format,
            output,
            flat,
            only,
            ignore,
            ignore_file,
            include_deps,
            threads,
            folding,
        } => {
            let mut config = base_config(path.clone(), &args, folding)?
                .with_ignore_patterns(ignore.clone())
                .with_include_deps(*include_deps)
                .with_threads(*threads);
            if !only.is_empty() {
                config = config.with_language_filter(parse_languages(only)?);
            }
            if let Some(ignore_file) = ignore_file {
                config = config.with_ignore_file(ignore_file.clone());
            }
            run_analyze(config, *format, output.as_deref(), *flat, &args)
        }
        Commands::Render {
            file,
            ansi,
            line_numbers,
            folding,
        } => {
            let config = base_config(PathBuf::from("."), &args, folding)?
                .with_line_numbers(*line_numbers);
            run_render(file, config, *ansi, &args)
        }
        Commands::List {
            file,
            format,
            folding,
        } => {
            let config = base_config(PathBuf::from("."), &args, folding)?;
            run_list(file, config, *format, &args)
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("foldline_core=debug,foldline=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file settings with command line overrides applied on top
fn base_config(root: PathBuf, args: &Args, folding: &FoldingArgs) -> anyhow::Result<ScanConfig> {
    let mut config = ScanConfig::new(root);

    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from(FoldConfig::FILE_NAME)).filter(|p| p.exists()),
    };
    if let Some(path) = config_path {
        debug!(path = %path.display(), "Loading config file");
        let file = FoldConfig::load(&path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        config = config.with_fold_config(&file)?;
    }

    if let Some(language) = &folding.language {
        config = config.with_forced_language(parse_language(language)?);
    }
    if let Some(collapse) = &folding.collapse {
        config = config.with_collapse(parse_fold_types(collapse)?);
    }
    if folding.disable {
        config = config.with_folding_enabled(false);
    }
    Ok(config)
}

fn parse_language(name: &str) -> anyhow::Result<Language> {
    Language::from_name(name).ok_or_else(|| anyhow!("Unknown language: {}", name))
}

fn parse_languages(names: &[String]) -> anyhow::Result<Vec<Language>> {
    names.iter().map(|name| parse_language(name)).collect()
}

fn parse_fold_types(list: &str) -> anyhow::Result<Vec<FoldType>> {
    if list.trim().eq_ignore_ascii_case("none") {
        return Ok(vec![]);
    }
    list.split(',')
        .filter(|t| !t.trim().is_empty())
        .map(|t| FoldType::from_name(t).ok_or_else(|| anyhow!("Unknown fold type: {}", t.trim())))
        .collect()
}

fn use_color(format: OutputFormatArg, args: &Args) -> OutputFormat {
    match format {
        OutputFormatArg::Ansi if args.no_color => OutputFormat::Summary,
        other => other.into(),
    }
}

fn write_output(output: &str, path: Option<&Path>, args: &Args) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if args.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }
    Ok(())
}

fn run_analyze(
    config: ScanConfig,
    format: OutputFormatArg,
    output_file: Option<&Path>,
    flat: bool,
    args: &Args,
) -> anyhow::Result<()> {
    let spinner = if args.verbose {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning project...");
        Some(pb)
    } else {
        None
    };

    let scanner = FoldScanner::new(config)?;
    let result = scanner.scan()?;

    if let Some(ref pb) = spinner {
        pb.finish_with_message(format!(
            "Scanned {} files in {}ms",
            result.stats.total_files, result.metadata.scan_duration_ms
        ));
    }

    let output_format = use_color(format, args);
    let output = if flat {
        format_output(&result, output_format)?
    } else {
        format_output_grouped(&result, output_format)?
    };

    write_output(&output, output_file, args)
}

fn run_render(file: &Path, config: ScanConfig, ansi: bool, args: &Args) -> anyhow::Result<()> {
    let rendered = if ansi || (atty::is(atty::Stream::Stdout) && !args.no_color) {
        render_file_ansi(file, &config)?
    } else {
        render_file(file, &config)?
    };

    println!("{}", rendered.content);

    if args.verbose {
        eprintln!(
            "\n--- {} folds, {} lines hidden ---",
            rendered.fold_count, rendered.lines_hidden
        );
    }

    Ok(())
}

fn run_list(
    file: &Path,
    config: ScanConfig,
    format: OutputFormatArg,
    args: &Args,
) -> anyhow::Result<()> {
    let scanner = FoldScanner::new(config)?;
    let source_file = scanner.scan_file(file)?;
    let output = format_file(&source_file, use_color(format, args))?;
    write_output(&output, None, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fold_types() {
        assert_eq!(
            parse_fold_types("comment, imports").unwrap(),
            vec![FoldType::Comment, FoldType::Imports]
        );
        assert_eq!(parse_fold_types("None").unwrap(), vec![]);
        assert_eq!(
            parse_fold_types("1001").unwrap(),
            vec![FoldType::user_defined(1001).unwrap()]
        );
        assert!(parse_fold_types("code,arglist").is_err());
    }

    #[test]
    fn test_parse_languages() {
        let languages = parse_languages(&["java".to_string(), "text/xml".to_string()]).unwrap();
        assert_eq!(languages, vec![Language::Java, Language::Xml]);
        assert!(parse_language("cobol").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let args = Args::try_parse_from([
            "foldline",
            "list",
            "A.java",
            "--format",
            "json",
            "--collapse",
            "imports",
        ])
        .unwrap();
        match &args.command {
            Commands::List {
                file,
                format,
                folding,
            } => {
                assert_eq!(file, &PathBuf::from("A.java"));
                assert!(matches!(format, OutputFormatArg::Json));
                assert_eq!(folding.collapse.as_deref(), Some("imports"));
            }
            _ => panic!("expected list"),
        }

        let args =
            Args::try_parse_from(["foldline", "--verbose", "analyze", "src", "--only", "java"])
                .unwrap();
        assert!(args.verbose);
        assert!(matches!(args.command, Commands::Analyze { ref only, .. } if only == &["java"]));
    }
}
