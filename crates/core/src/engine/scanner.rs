use super::{FoldCollapser, FoldManager};
use crate::config::{ConfigError, IgnoreFilter, ScanConfig};
use crate::document::PositionService;
use crate::error::FoldError;
use crate::models::{FoldMap, FoldStats, Language, ScanMetadata, SourceFile};
use crate::parsers::FoldParserRegistry;
use crate::text::TextDocument;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Fold error: {0}")]
    FoldError(#[from] FoldError),
    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),
}

/// A parsed document together with the manager tracking its folds
#[derive(Debug)]
pub struct FoldedDocument {
    pub document: TextDocument,
    pub manager: FoldManager,
}

impl FoldedDocument {
    /// Parse `content`, then collapse the fold types the config asks for
    pub fn open(
        content: &str,
        language: Language,
        registry: Arc<FoldParserRegistry>,
        config: &ScanConfig,
    ) -> Result<Self, FoldError> {
        let document = TextDocument::new(content, language.id());
        let mut manager = FoldManager::new(registry, language.id());
        manager.set_enabled(config.folding_enabled, &document)?;
        manager.reparse(&document)?;
        FoldCollapser::with_types(config.collapse.iter().copied())
            .collapse_folds(&mut manager, &document);
        manager.drain_events();
        Ok(Self { document, manager })
    }
}

/// Main scanner for analyzing foldable regions across a project
pub struct FoldScanner {
    config: ScanConfig,
    ignore_filter: IgnoreFilter,
    registry: Arc<FoldParserRegistry>,
}

impl FoldScanner {
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        Self::with_registry(config, Arc::new(FoldParserRegistry::with_builtins()))
    }

    pub fn with_registry(
        config: ScanConfig,
        registry: Arc<FoldParserRegistry>,
    ) -> Result<Self, ScanError> {
        let ignore_filter = IgnoreFilter::new(&config)?;
        Ok(Self {
            config,
            ignore_filter,
            registry,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the project and return the fold map
    pub fn scan(&self) -> Result<FoldMap, ScanError> {
        let start = Instant::now();

        let source_files = self.find_source_files();
        debug!(
            root = %self.config.root.display(),
            files = source_files.len(),
            "Found source files"
        );

        let files: Vec<SourceFile> = if self.config.threads == 1 {
            source_files
                .iter()
                .map(|(path, lang)| self.parse_file(path, *lang))
                .collect()
        } else {
            let pool = if self.config.threads > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.threads)
                    .build()
                    .ok()
            } else {
                None
            };

            match pool {
                Some(pool) => pool.install(|| {
                    source_files
                        .par_iter()
                        .map(|(path, lang)| self.parse_file(path, *lang))
                        .collect()
                }),
                None => source_files
                    .par_iter()
                    .map(|(path, lang)| self.parse_file(path, *lang))
                    .collect(),
            }
        };

        let stats = Self::calculate_stats(&files);

        let duration = start.elapsed();
        let metadata = ScanMetadata {
            scan_duration_ms: duration.as_millis() as u64,
            files_per_second: if duration.as_secs_f64() > 0.0 {
                files.len() as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
            ..ScanMetadata::default()
        };

        Ok(FoldMap {
            root: self.config.root.clone(),
            files,
            stats,
            metadata,
        })
    }

    /// Scan a single file
    pub fn scan_file(&self, path: &Path) -> Result<SourceFile, ScanError> {
        let language = self
            .config
            .language_for_path(path)
            .ok_or_else(|| ScanError::UnsupportedFile(path.to_path_buf()))?;
        let content = fs::read_to_string(path)?;
        let folded = self.open(&content, language)?;
        Ok(self.source_file(path, language, &folded))
    }

    /// Parse in-memory source with this scanner's registry and settings
    pub fn open(&self, content: &str, language: Language) -> Result<FoldedDocument, FoldError> {
        FoldedDocument::open(content, language, Arc::clone(&self.registry), &self.config)
    }

    fn find_source_files(&self) -> Vec<(PathBuf, Language)> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.config.root)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !self
                        .ignore_filter
                        .should_ignore(entry.path(), entry.file_type().is_dir())
            })
            .filter_map(|e| e.ok());

        for entry in walker {
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let Some(language) = self.config.language_for_path(path) else {
                continue;
            };
            if !IgnoreFilter::matches_language_filter(language, &self.config.language_filter) {
                continue;
            }
            files.push((path.to_path_buf(), language));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Parse a single source file, recording failures on the result
    fn parse_file(&self, path: &Path, language: Language) -> SourceFile {
        let outcome = fs::read_to_string(path)
            .map_err(ScanError::from)
            .and_then(|content| self.open(&content, language).map_err(ScanError::from));

        match outcome {
            Ok(folded) => self.source_file(path, language, &folded),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse file");
                SourceFile {
                    path: self.relative_path(path),
                    absolute_path: path.to_path_buf(),
                    language,
                    folds: vec![],
                    line_count: 0,
                    hidden_lines: 0,
                    parsed: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn source_file(&self, path: &Path, language: Language, folded: &FoldedDocument) -> SourceFile {
        let FoldedDocument { document, manager } = folded;
        SourceFile {
            path: self.relative_path(path),
            absolute_path: path.to_path_buf(),
            language,
            folds: manager.outline(document),
            line_count: document.line_count(),
            hidden_lines: manager.hidden_line_count(document),
            parsed: true,
            error: None,
        }
    }

    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .to_path_buf()
    }

    fn calculate_stats(files: &[SourceFile]) -> FoldStats {
        let mut stats = FoldStats::default();
        for file in files {
            stats.add_file(file);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoldType;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(
            root.join("src/Main.java"),
            "import a.B;\nimport a.C;\n/*\n * docs\n */\nclass Main {\n  void run() {\n  }\n}\n",
        )
        .unwrap();
        fs::write(root.join("src/data.json"), "{\n  \"a\": [\n    1\n  ]\n}\n").unwrap();
        fs::write(root.join("README.md"), "# readme\n").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "f() {\n}\n").unwrap();
        dir
    }

    #[test]
    fn test_scanner_creation() {
        let config = ScanConfig::default();
        let scanner = FoldScanner::new(config);
        assert!(scanner.is_ok());
    }

    #[test]
    fn test_scan_project() {
        let dir = project();
        let config = ScanConfig::new(dir.path().to_path_buf()).with_threads(1);
        let fold_map = FoldScanner::new(config).unwrap().scan().unwrap();

        let paths: Vec<PathBuf> = fold_map.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("src/Main.java"), PathBuf::from("src/data.json")]
        );
        assert!(fold_map.files.iter().all(|f| f.parsed));

        let stats = &fold_map.stats;
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.import_folds, 1);
        assert_eq!(stats.comment_folds, 1);
        assert_eq!(stats.code_folds, 4);
        assert_eq!(stats.max_depth, 2);
        // The comment is collapsed on open
        assert_eq!(stats.hidden_lines, 2);
        assert_eq!(stats.files_by_language.get("json"), Some(&1));
    }

    #[test]
    fn test_scan_with_language_filter_in_parallel() {
        let dir = project();
        let config = ScanConfig::new(dir.path().to_path_buf())
            .with_language_filter(vec![Language::Json])
            .with_threads(2);
        let fold_map = FoldScanner::new(config).unwrap().scan().unwrap();
        assert_eq!(fold_map.files.len(), 1);
        assert_eq!(fold_map.files[0].language, Language::Json);
        assert_eq!(fold_map.files[0].fold_count(), 2);
    }

    #[test]
    fn test_include_deps() {
        let dir = project();
        let config = ScanConfig::new(dir.path().to_path_buf())
            .with_include_deps(true)
            .with_language_filter(vec![Language::JavaScript]);
        let fold_map = FoldScanner::new(config).unwrap().scan().unwrap();
        assert_eq!(fold_map.files.len(), 1);
    }

    #[test]
    fn test_scan_file() {
        let dir = project();
        let config = ScanConfig::new(dir.path().to_path_buf())
            .with_collapse(vec![FoldType::Imports, FoldType::Comment]);
        let scanner = FoldScanner::new(config).unwrap();
        let file = scanner
            .scan_file(&dir.path().join("src/Main.java"))
            .unwrap();
        assert_eq!(file.path, PathBuf::from("src/Main.java"));
        assert_eq!(file.line_count, 10);
        assert_eq!(file.hidden_lines, 3);
        assert_eq!(file.folds[0].fold_type, FoldType::Imports);
        assert!(file.folds[0].collapsed);

        assert!(matches!(
            scanner.scan_file(&dir.path().join("README.md")),
            Err(ScanError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_folding_disabled() {
        let config = ScanConfig::default().with_folding_enabled(false);
        let scanner = FoldScanner::new(config).unwrap();
        let folded = scanner.open("/*\n*/\n", Language::C).unwrap();
        assert!(!folded.manager.is_enabled());
        assert!(folded.manager.forest().is_empty());
    }
}
