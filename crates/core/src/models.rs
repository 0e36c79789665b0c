use crate::error::FoldError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Smallest value a user-defined fold type may take.
pub const FOLD_TYPE_USER_DEFINED_MIN: u32 = 1000;

/// Type of foldable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldType {
    /// Braces, tags, environments and other structural blocks
    Code,
    /// Multi-line comments
    Comment,
    /// A contiguous group of import statements
    Imports,
    /// Minted by third-party parsers through [`FoldType::user_defined`]
    UserDefined(UserFoldType),
}

/// Number of a user-defined fold type, never below
/// [`FOLD_TYPE_USER_DEFINED_MIN`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct UserFoldType(u32);

impl UserFoldType {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for UserFoldType {
    type Error = FoldError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value < FOLD_TYPE_USER_DEFINED_MIN {
            return Err(FoldError::InvalidUserFoldType {
                value,
                min: FOLD_TYPE_USER_DEFINED_MIN,
            });
        }
        Ok(UserFoldType(value))
    }
}

impl From<UserFoldType> for u32 {
    fn from(fold_type: UserFoldType) -> u32 {
        fold_type.0
    }
}

impl FoldType {
    /// Create a user-defined fold type, rejecting values that would collide
    /// with the built-in types.
    pub fn user_defined(value: u32) -> Result<Self, FoldError> {
        UserFoldType::try_from(value).map(FoldType::UserDefined)
    }

    /// Parse a fold type name as used on the command line and in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "code" | "block" => Some(FoldType::Code),
            "comment" | "comments" => Some(FoldType::Comment),
            "import" | "imports" => Some(FoldType::Imports),
            other => other
                .parse::<u32>()
                .ok()
                .and_then(|n| FoldType::user_defined(n).ok()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FoldType::Code => "code",
            FoldType::Comment => "comment",
            FoldType::Imports => "imports",
            FoldType::UserDefined(_) => "user",
        }
    }
}

impl fmt::Display for FoldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldType::UserDefined(n) => write!(f, "user({})", n.value()),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Built-in languages with fold support.
///
/// The identifiers returned by [`Language::id`] are the keys of the default
/// [`FoldParserRegistry`](crate::parsers::FoldParserRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    CSharp,
    Clojure,
    Css,
    Groovy,
    Html,
    Java,
    JavaScript,
    Json,
    Jsp,
    Latex,
    Lisp,
    Mxml,
    Nsis,
    Perl,
    Php,
    Scala,
    Xml,
    PlainText,
}

impl Language {
    pub const ALL: [Language; 20] = [
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Clojure,
        Language::Css,
        Language::Groovy,
        Language::Html,
        Language::Java,
        Language::JavaScript,
        Language::Json,
        Language::Jsp,
        Language::Latex,
        Language::Lisp,
        Language::Mxml,
        Language::Nsis,
        Language::Perl,
        Language::Php,
        Language::Scala,
        Language::Xml,
        Language::PlainText,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Language::Cpp),
            "cs" => Some(Language::CSharp),
            "clj" | "cljs" | "cljc" | "edn" => Some(Language::Clojure),
            "css" => Some(Language::Css),
            "groovy" | "gradle" => Some(Language::Groovy),
            "html" | "htm" | "xhtml" => Some(Language::Html),
            "java" => Some(Language::Java),
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => Some(Language::JavaScript),
            "json" => Some(Language::Json),
            "jsp" => Some(Language::Jsp),
            "tex" | "sty" | "cls" | "ltx" => Some(Language::Latex),
            "lisp" | "lsp" | "el" | "cl" | "scm" => Some(Language::Lisp),
            "mxml" => Some(Language::Mxml),
            "nsi" | "nsh" => Some(Language::Nsis),
            "pl" | "pm" => Some(Language::Perl),
            "php" | "phtml" => Some(Language::Php),
            "scala" | "sc" => Some(Language::Scala),
            "xml" | "xsd" | "xsl" | "xslt" | "svg" | "pom" => Some(Language::Xml),
            "txt" | "text" => Some(Language::PlainText),
            _ => None,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Language::ALL.iter().copied().find(|l| l.id() == id)
    }

    /// Accepts a short name (`java`), an id (`text/java`) or an extension
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == name || l.id() == name)
            .or_else(|| Language::from_extension(&name))
    }

    /// Syntax-style identifier of this language
    pub fn id(&self) -> &'static str {
        match self {
            Language::C => "text/c",
            Language::Cpp => "text/cpp",
            Language::CSharp => "text/cs",
            Language::Clojure => "text/clojure",
            Language::Css => "text/css",
            Language::Groovy => "text/groovy",
            Language::Html => "text/html",
            Language::Java => "text/java",
            Language::JavaScript => "text/javascript",
            Language::Json => "text/json",
            Language::Jsp => "text/jsp",
            Language::Latex => "text/latex",
            Language::Lisp => "text/lisp",
            Language::Mxml => "text/mxml",
            Language::Nsis => "text/nsis",
            Language::Perl => "text/perl",
            Language::Php => "text/php",
            Language::Scala => "text/scala",
            Language::Xml => "text/xml",
            Language::PlainText => "text/plain",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Clojure => "clojure",
            Language::Css => "css",
            Language::Groovy => "groovy",
            Language::Html => "html",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Json => "json",
            Language::Jsp => "jsp",
            Language::Latex => "latex",
            Language::Lisp => "lisp",
            Language::Mxml => "mxml",
            Language::Nsis => "nsis",
            Language::Perl => "perl",
            Language::Php => "php",
            Language::Scala => "scala",
            Language::Xml => "xml",
            Language::PlainText => "plain",
        }
    }
}

/// Serializable snapshot of a fold and its descendants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldOutline {
    pub fold_type: FoldType,
    /// Start byte offset in the document
    pub start_offset: usize,
    /// End byte offset, absent for folds that run to the end of the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
    /// Start line (0-indexed)
    pub start_line: usize,
    /// End line (0-indexed)
    pub end_line: usize,
    /// Lines hidden when collapsed
    pub line_count: usize,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FoldOutline>,
}

impl FoldOutline {
    /// Number of folds in this subtree, including this one
    pub fn fold_count(&self) -> usize {
        1 + self.children.iter().map(FoldOutline::fold_count).sum::<usize>()
    }

    /// Visit this outline and every descendant in pre-order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FoldOutline)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A source file with its fold forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Relative path from project root
    pub path: PathBuf,
    /// Absolute path
    pub absolute_path: PathBuf,
    /// Detected language
    pub language: Language,
    /// Top-level folds with their nested folds
    pub folds: Vec<FoldOutline>,
    /// Total line count
    pub line_count: usize,
    /// Lines hidden by the folds collapsed on open
    pub hidden_lines: usize,
    /// Whether the file was parsed successfully
    pub parsed: bool,
    /// Parse error message if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceFile {
    pub fn fold_count(&self) -> usize {
        self.folds.iter().map(FoldOutline::fold_count).sum()
    }
}

/// Statistics about fold analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoldStats {
    pub total_files: usize,
    pub total_folds: usize,
    pub code_folds: usize,
    pub comment_folds: usize,
    pub import_folds: usize,
    pub user_folds: usize,
    pub max_depth: usize,
    pub total_lines: usize,
    pub foldable_lines: usize,
    pub hidden_lines: usize,
    /// File count per language
    pub files_by_language: BTreeMap<String, usize>,
}

impl FoldStats {
    pub fn add_fold(&mut self, fold_type: &FoldType) {
        self.total_folds += 1;
        match fold_type {
            FoldType::Code => self.code_folds += 1,
            FoldType::Comment => self.comment_folds += 1,
            FoldType::Imports => self.import_folds += 1,
            FoldType::UserDefined(_) => self.user_folds += 1,
        }
    }

    pub fn add_file(&mut self, file: &SourceFile) {
        self.total_files += 1;
        self.total_lines += file.line_count;
        self.hidden_lines += file.hidden_lines;
        *self
            .files_by_language
            .entry(file.language.as_str().to_string())
            .or_default() += 1;

        for root in &file.folds {
            // Only top-level folds count towards foldable lines, nested ones overlap them
            self.foldable_lines += root.line_count;
            self.walk_depth(root, 1);
        }
    }

    fn walk_depth(&mut self, fold: &FoldOutline, depth: usize) {
        self.add_fold(&fold.fold_type);
        self.max_depth = self.max_depth.max(depth);
        for child in &fold.children {
            self.walk_depth(child, depth + 1);
        }
    }
}

/// Scan metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_duration_ms: u64,
    pub files_per_second: f64,
    pub timestamp: String,
    pub tool_version: String,
}

impl Default for ScanMetadata {
    fn default() -> Self {
        Self {
            scan_duration_ms: 0,
            files_per_second: 0.0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Aggregated fold analysis results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldMap {
    /// Project root path
    pub root: PathBuf,
    /// All source files analyzed
    pub files: Vec<SourceFile>,
    /// Fold statistics
    pub stats: FoldStats,
    /// Scan metadata
    pub metadata: ScanMetadata,
}

impl FoldMap {
    /// Split files and statistics into one section per language
    pub fn to_grouped(&self) -> GroupedFoldMap {
        let mut languages: BTreeMap<String, LanguageSection> = BTreeMap::new();
        for file in &self.files {
            let section = languages
                .entry(file.language.as_str().to_string())
                .or_default();
            section.stats.add_file(file);
            section.files.push(file.clone());
        }

        GroupedFoldMap {
            root: self.root.clone(),
            languages,
            metadata: self.metadata.clone(),
        }
    }
}

/// Files and statistics of one language
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageSection {
    pub files: Vec<SourceFile>,
    pub stats: FoldStats,
}

/// Fold map with a section per language, keyed by short language name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedFoldMap {
    pub root: PathBuf,
    pub languages: BTreeMap<String, LanguageSection>,
    pub metadata: ScanMetadata,
}

/// Rendered output for a single file
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub content: String,
    pub fold_count: usize,
    pub lines_hidden: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defined_fold_type_range() {
        let fold_type = FoldType::user_defined(1000).unwrap();
        assert!(matches!(fold_type, FoldType::UserDefined(n) if n.value() == 1000));
        assert!(matches!(
            FoldType::user_defined(3),
            Err(FoldError::InvalidUserFoldType { value: 3, .. })
        ));
    }

    #[test]
    fn test_user_fold_type_is_checked_when_deserialized() {
        let fold_type: FoldType = serde_json::from_str(r#"{"user_defined":1042}"#).unwrap();
        assert_eq!(fold_type.to_string(), "user(1042)");
        assert_eq!(serde_json::to_string(&fold_type).unwrap(), r#"{"user_defined":1042}"#);
        assert!(serde_json::from_str::<FoldType>(r#"{"user_defined":7}"#).is_err());
    }

    #[test]
    fn test_fold_type_from_name() {
        assert_eq!(FoldType::from_name("Comment"), Some(FoldType::Comment));
        assert_eq!(FoldType::from_name(" imports "), Some(FoldType::Imports));
        assert_eq!(FoldType::from_name("1042"), FoldType::user_defined(1042).ok());
        assert_eq!(FoldType::from_name("12"), None);
        assert_eq!(FoldType::from_name("arglist"), None);
    }

    #[test]
    fn test_language_ids_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::from_id(language.id()), Some(language));
        }
        assert_eq!(Language::from_extension("JAVA"), Some(Language::Java));
        assert_eq!(Language::from_extension("rs"), None);
        assert_eq!(Language::from_name("Java"), Some(Language::Java));
        assert_eq!(Language::from_name("text/cs"), Some(Language::CSharp));
        assert_eq!(Language::from_name("hpp"), Some(Language::Cpp));
        assert_eq!(Language::from_name("cobol"), None);
    }

    #[test]
    fn test_stats_count_nested_folds() {
        let leaf = FoldOutline {
            fold_type: FoldType::Comment,
            start_offset: 4,
            end_offset: Some(10),
            start_line: 1,
            end_line: 2,
            line_count: 1,
            collapsed: false,
            children: vec![],
        };
        let root = FoldOutline {
            fold_type: FoldType::Code,
            start_offset: 0,
            end_offset: Some(20),
            start_line: 0,
            end_line: 4,
            line_count: 4,
            collapsed: false,
            children: vec![leaf],
        };
        let file = SourceFile {
            path: PathBuf::from("a.java"),
            absolute_path: PathBuf::from("/a.java"),
            language: Language::Java,
            folds: vec![root],
            line_count: 5,
            hidden_lines: 0,
            parsed: true,
            error: None,
        };

        let mut stats = FoldStats::default();
        stats.add_file(&file);
        assert_eq!(stats.total_folds, 2);
        assert_eq!(stats.code_folds, 1);
        assert_eq!(stats.comment_folds, 1);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.foldable_lines, 4);
        assert_eq!(stats.files_by_language.get("java"), Some(&1));
        assert_eq!(file.fold_count(), 2);

        let fold_map = FoldMap {
            root: PathBuf::from("/"),
            files: vec![file],
            stats,
            metadata: ScanMetadata::default(),
        };
        let grouped = fold_map.to_grouped();
        assert_eq!(grouped.languages.len(), 1);
        assert_eq!(grouped.languages["java"].stats.total_folds, 2);
        assert_eq!(grouped.languages["java"].files.len(), 1);
    }
}
