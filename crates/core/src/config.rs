use crate::models::{FoldType, Language};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to build glob pattern: {0}")]
    GlobError(#[from] globset::Error),
    #[error("Failed to parse gitignore: {0}")]
    GitignoreError(#[from] ignore::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Unknown fold type: {0}")]
    UnknownFoldType(String),
    #[error("Unknown language for extension {extension}: {language}")]
    UnknownLanguage { extension: String, language: String },
}

/// Folding settings read from a `foldline.toml` file.
///
/// ```toml
/// enabled = true
/// collapse = ["comment", "imports"]
///
/// [languages]
/// gradle = "text/groovy"
/// tpl = "html"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldConfig {
    /// Whether folding is on at all
    pub enabled: bool,
    /// Fold types collapsed when a file is opened
    pub collapse: Vec<String>,
    /// File extension to language overrides
    pub languages: BTreeMap<String, String>,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collapse: vec![],
            languages: BTreeMap::new(),
        }
    }
}

impl FoldConfig {
    pub const FILE_NAME: &'static str = "foldline.toml";

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn collapse_types(&self) -> Result<Vec<FoldType>, ConfigError> {
        self.collapse
            .iter()
            .map(|name| {
                FoldType::from_name(name).ok_or_else(|| ConfigError::UnknownFoldType(name.clone()))
            })
            .collect()
    }

    pub fn language_overrides(&self) -> Result<BTreeMap<String, Language>, ConfigError> {
        self.languages
            .iter()
            .map(|(extension, name)| {
                let language =
                    Language::from_name(name).ok_or_else(|| ConfigError::UnknownLanguage {
                        extension: extension.clone(),
                        language: name.clone(),
                    })?;
                Ok((extension.trim_start_matches('.').to_lowercase(), language))
            })
            .collect()
    }
}

/// Configuration for scanning and rendering
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// Filter to specific languages
    pub language_filter: Option<Vec<Language>>,
    /// Additional ignore patterns (glob style)
    pub ignore_patterns: Vec<String>,
    /// Custom ignore file path
    pub ignore_file: Option<PathBuf>,
    /// Include vendored and build output directories in the scan
    pub include_deps: bool,
    /// Number of threads (0 = auto)
    pub threads: usize,
    /// Fold types collapsed when a file is opened
    pub collapse: Vec<FoldType>,
    /// Folding on or off
    pub folding_enabled: bool,
    /// Extension to language overrides, checked before the built-in table
    pub language_overrides: BTreeMap<String, Language>,
    /// Language used for every file regardless of its extension
    pub forced_language: Option<Language>,
    /// Prefix rendered lines with line numbers
    pub line_numbers: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            language_filter: None,
            ignore_patterns: vec![],
            ignore_file: None,
            include_deps: false,
            threads: 0,
            collapse: vec![FoldType::Comment],
            folding_enabled: true,
            language_overrides: BTreeMap::new(),
            forced_language: None,
            line_numbers: false,
        }
    }
}

impl ScanConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    pub fn with_language_filter(mut self, languages: Vec<Language>) -> Self {
        self.language_filter = Some(languages);
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_ignore_file(mut self, path: PathBuf) -> Self {
        self.ignore_file = Some(path);
        self
    }

    pub fn with_include_deps(mut self, include: bool) -> Self {
        self.include_deps = include;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_collapse(mut self, types: Vec<FoldType>) -> Self {
        self.collapse = types;
        self
    }

    pub fn with_folding_enabled(mut self, enabled: bool) -> Self {
        self.folding_enabled = enabled;
        self
    }

    pub fn with_language_override(mut self, extension: &str, language: Language) -> Self {
        self.language_overrides
            .insert(extension.trim_start_matches('.').to_lowercase(), language);
        self
    }

    pub fn with_forced_language(mut self, language: Language) -> Self {
        self.forced_language = Some(language);
        self
    }

    pub fn with_line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    /// Apply the settings of a config file on top of this configuration
    pub fn with_fold_config(mut self, file: &FoldConfig) -> Result<Self, ConfigError> {
        self.folding_enabled = file.enabled;
        if !file.collapse.is_empty() {
            self.collapse = file.collapse_types()?;
        }
        self.language_overrides.extend(file.language_overrides()?);
        Ok(self)
    }

    /// Language of a file, from the overrides first and then its extension
    pub fn language_for_path(&self, path: &Path) -> Option<Language> {
        if self.forced_language.is_some() {
            return self.forced_language;
        }
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        self.language_overrides
            .get(&ext)
            .copied()
            .or_else(|| Language::from_extension(&ext))
    }
}

/// Filter for ignoring files and directories
pub struct IgnoreFilter {
    gitignore: Option<Gitignore>,
    custom_globs: GlobSet,
    default_ignores: GlobSet,
}

impl IgnoreFilter {
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let gitignore = match &config.ignore_file {
            Some(ignore_file) => Some(Self::build_gitignore(&config.root, ignore_file)?),
            None => {
                let gitignore_path = config.root.join(".gitignore");
                if gitignore_path.exists() {
                    Some(Self::build_gitignore(&config.root, &gitignore_path)?)
                } else {
                    None
                }
            }
        };

        let mut custom_builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            custom_builder.add(Glob::new(pattern)?);
        }
        let custom_globs = custom_builder.build()?;

        let mut default_builder = GlobSetBuilder::new();
        if !config.include_deps {
            for pattern in [
                "**/node_modules/**",
                "**/bower_components/**",
                "**/vendor/**",
                "**/dist/**",
                "**/build/**",
                "**/target/**",
                "**/.git/**",
                "**/.svn/**",
                "**/*.min.js",
                "**/*.min.css",
                "**/.DS_Store",
            ] {
                default_builder.add(Glob::new(pattern)?);
            }
        }
        let default_ignores = default_builder.build()?;

        Ok(Self {
            gitignore,
            custom_globs,
            default_ignores,
        })
    }

    fn build_gitignore(root: &Path, file: &Path) -> Result<Gitignore, ConfigError> {
        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(file) {
            return Err(err.into());
        }
        Ok(builder.build()?)
    }

    /// Check if a path should be ignored
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let path_str = path.to_string_lossy();

        if self.default_ignores.is_match(&*path_str) || self.custom_globs.is_match(&*path_str) {
            return true;
        }

        match &self.gitignore {
            Some(gi) => gi.matched(path, is_dir).is_ignore(),
            None => false,
        }
    }

    /// Check if a language passes the configured filter
    pub fn matches_language_filter(language: Language, filter: &Option<Vec<Language>>) -> bool {
        match filter {
            None => true,
            Some(languages) => languages.contains(&language),
        }
    }
}
