//! Framework rule sets: path selection and content cleanup patterns loaded from TOML.

use crate::combine::GroupRule;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// What a pattern list is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
    /// A file is eligible if any pattern matches its path
    Include,
    /// A file is rejected if any pattern matches its path, overriding include
    Exclude,
    /// Every match is deleted from minified content, pattern by pattern
    ContentCleanup,
}

/// An ordered list of compiled patterns sharing one role
#[derive(Debug, Clone)]
pub struct PatternSet {
    role: PatternRole,
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile `sources` in order.
    ///
    /// A pattern that fails to compile is logged and left out, so it never
    /// matches and never deletes anything.
    pub fn compile<S: AsRef<str>>(role: PatternRole, sources: &[S]) -> Self {
        let patterns = sources
            .iter()
            .filter_map(|source| {
                let source = source.as_ref();
                match Regex::new(source) {
                    Ok(regex) => Some(regex),
                    Err(err) => {
                        warn!(?role, pattern = source, "Ignoring malformed pattern: {err}");
                        None
                    }
                }
            })
            .collect();

        PatternSet { role, patterns }
    }

    pub fn role(&self) -> PatternRole {
        self.role
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any pattern matches `text`
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }

    /// Delete every match of every pattern from `text`, in list order
    pub fn strip(&self, text: &str) -> String {
        self.patterns.iter().fold(text.to_string(), |content, pattern| {
            pattern.replace_all(&content, "").into_owned()
        })
    }
}

/// Decide whether a file is kept, from its path relative to the source root.
///
/// Selection is an allowlist: nothing is kept unless an include pattern
/// matches, and an exclude match always wins over an include match.
pub fn is_selected(relative_path: &str, include: &PatternSet, exclude: &PatternSet) -> bool {
    let mut keep = include.matches(relative_path);

    if keep && exclude.matches(relative_path) {
        keep = false;
    }

    keep
}

/// Remove boilerplate from already-minified content.
///
/// Patterns such as `public function toArray\(\).*?\}` stop at the first
/// closing brace, so a method with nested blocks is only partially removed.
pub fn apply_content_cleanup(text: &str, cleanup: &PatternSet) -> String {
    cleanup.strip(text)
}

/// Structure to deserialize a rule set from TOML
#[derive(Debug, Deserialize)]
struct RuleSetConfig {
    name: String,
    #[serde(default = "default_extensions")]
    extensions: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    content_remove: Vec<String>,
    #[serde(default)]
    groups: Vec<GroupConfig>,
    #[serde(default)]
    bundle: BundleConfig,
}

#[derive(Debug, Deserialize)]
struct GroupConfig {
    name: String,
    pattern: String,
}

#[derive(Debug, Default, Deserialize)]
struct BundleConfig {
    #[serde(default)]
    preamble: String,
    strip: Option<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["php".to_string()]
}

// Embed the default rule set directly in the binary at compile time
const LARAVEL_RULES_TOML: &str = include_str!("../rules/laravel.toml");

/// Immutable framework configuration: which files to keep, what to remove
/// from them and how to order them in a combined bundle
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: String,
    /// Lowercase extensions (without the dot) considered in framework mode
    pub extensions: Vec<String>,
    pub include: PatternSet,
    pub exclude: PatternSet,
    pub content_remove: PatternSet,
    /// Combined output groups in emission order
    pub groups: Vec<GroupRule>,
    /// Text that opens a combined bundle
    pub preamble: String,
    /// Removed from the start of each file body inside a combined bundle
    pub strip: PatternSet,
}

impl RuleSet {
    /// The built-in Laravel rule set
    pub fn laravel() -> Result<Self> {
        RuleSet::from_toml_str(LARAVEL_RULES_TOML).context("Failed to parse built-in Laravel rules")
    }

    /// Load a rule set from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        RuleSet::from_toml_str(&content)
            .with_context(|| format!("Failed to parse rules file {}", path.display()))
    }

    /// Parse a rule set from TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RuleSetConfig = toml::from_str(content).context("Invalid rules TOML")?;

        let groups = config
            .groups
            .into_iter()
            .filter_map(|group| match Regex::new(&group.pattern) {
                Ok(pattern) => Some(GroupRule::new(group.name, pattern)),
                Err(err) => {
                    warn!(
                        group = %group.name,
                        pattern = %group.pattern,
                        "Ignoring group with malformed pattern: {err}"
                    );
                    None
                }
            })
            .collect();

        let strip: Vec<String> = config.bundle.strip.into_iter().collect();

        Ok(RuleSet {
            name: config.name,
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            include: PatternSet::compile(PatternRole::Include, &config.include),
            exclude: PatternSet::compile(PatternRole::Exclude, &config.exclude),
            content_remove: PatternSet::compile(PatternRole::ContentCleanup, &config.content_remove),
            groups,
            preamble: config.bundle.preamble,
            strip: PatternSet::compile(PatternRole::ContentCleanup, &strip),
        })
    }

    /// Whether files at `path` are considered at all in framework mode
    pub fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Keep/drop decision for a path relative to the source root
    pub fn select(&self, relative_path: &str) -> bool {
        is_selected(relative_path, &self.include, &self.exclude)
    }

    /// Apply the content cleanup patterns to minified text
    pub fn clean(&self, text: &str) -> String {
        apply_content_cleanup(text, &self.content_remove)
    }

    /// Extension used for the default combined bundle file name
    pub fn bundle_extension(&self) -> &str {
        self.extensions.first().map(String::as_str).unwrap_or("txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(role: PatternRole, sources: &[&str]) -> PatternSet {
        PatternSet::compile(role, sources)
    }

    #[test]
    fn test_selection_defaults_to_reject() {
        let include = set(PatternRole::Include, &[]);
        let exclude = set(PatternRole::Exclude, &[]);
        assert!(!is_selected("app/Models/User.php", &include, &exclude));
    }

    #[test]
    fn test_selection_include() {
        let include = set(PatternRole::Include, &[r"Models/.*\.php$", r"Services/.*Service\.php$"]);
        let exclude = set(PatternRole::Exclude, &[]);
        assert!(is_selected("app/Models/User.php", &include, &exclude));
        assert!(is_selected("app/Services/EmailService.php", &include, &exclude));
        assert!(!is_selected("app/Services/Helper.php", &include, &exclude));
        assert!(!is_selected("config/app.php", &include, &exclude));
    }

    #[test]
    fn test_exclude_overrides_include() {
        let include = set(PatternRole::Include, &[r"Middleware/.*\.php$"]);
        let exclude = set(PatternRole::Exclude, &[r"Middleware/Authenticate\.php$"]);
        assert!(!is_selected("app/Http/Middleware/Authenticate.php", &include, &exclude));
        assert!(is_selected("app/Http/Middleware/CheckRole.php", &include, &exclude));
    }

    #[test]
    fn test_exclude_alone_never_selects() {
        let include = set(PatternRole::Include, &[]);
        let exclude = set(PatternRole::Exclude, &[r"Authenticate\.php$"]);
        assert!(!is_selected("app/Http/Middleware/Other.php", &include, &exclude));
    }

    #[test]
    fn test_malformed_patterns_are_skipped() {
        let include = set(PatternRole::Include, &[r"Models/(unclosed", r"Models/.*\.php$"]);
        assert_eq!(include.len(), 1);
        assert_eq!(include.role(), PatternRole::Include);

        let exclude = set(PatternRole::Exclude, &[r"[broken"]);
        assert!(exclude.is_empty());
        assert!(is_selected("app/Models/User.php", &include, &exclude));

        let cleanup = set(PatternRole::ContentCleanup, &[r"(?P<oops"]);
        assert_eq!(apply_content_cleanup("class A{}", &cleanup), "class A{}");
    }

    #[test]
    fn test_content_cleanup_applies_in_order() {
        let cleanup = set(PatternRole::ContentCleanup, &["abc", "b"]);
        // "abc" goes first, so the "b" inside it is already gone
        assert_eq!(apply_content_cleanup("abcb", &cleanup), "");
        let reversed = set(PatternRole::ContentCleanup, &["b", "abc"]);
        assert_eq!(apply_content_cleanup("abcb", &reversed), "ac");
    }

    #[test]
    fn test_laravel_rules_load() {
        let rules = RuleSet::laravel().unwrap();
        assert_eq!(rules.name, "laravel");
        assert_eq!(rules.extensions, vec!["php"]);
        assert_eq!(rules.include.len(), 21);
        assert_eq!(rules.exclude.len(), 2);
        assert_eq!(rules.content_remove.len(), 4);
        let names: Vec<&str> = rules.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["models", "services", "events", "listeners", "controllers"]);
        assert_eq!(rules.preamble, "<?php\n");
        assert_eq!(rules.bundle_extension(), "php");
    }

    #[test]
    fn test_laravel_cleanup_removes_boilerplate() {
        let rules = RuleSet::laravel().unwrap();
        let minified = r#"<?php namespace App\Models;class User{protected $fillable=["name","email"];protected $casts=["created_at"=>"datetime"];public function __construct(){}public function toArray(){return["id"=>$this->id];}public function posts(){return $this->hasMany(Post::class);}}"#;
        let cleaned = rules.clean(minified);
        assert_eq!(
            cleaned,
            r#"<?php namespace App\Models;class User{public function posts(){return $this->hasMany(Post::class);}}"#
        );
    }

    #[test]
    fn test_laravel_cleanup_keeps_constructor_with_arguments() {
        let rules = RuleSet::laravel().unwrap();
        let minified = r#"class E{public function __construct($user){$this->user=$user;}}"#;
        assert_eq!(rules.clean(minified), minified);
    }

    #[test]
    fn test_handles_extension() {
        let rules = RuleSet::laravel().unwrap();
        assert!(rules.handles(Path::new("app/Models/User.php")));
        assert!(rules.handles(Path::new("app/Models/User.PHP")));
        assert!(!rules.handles(Path::new("resources/js/app.js")));
        assert!(!rules.handles(Path::new("README")));
    }

    #[test]
    fn test_custom_rules_from_toml() {
        let rules = RuleSet::from_toml_str(
            r#"
            name = "symfony"
            extensions = [".PHP", "twig"]
            include = ['src/Controller/.*\.php$']
            exclude = ['Kernel\.php$']

            [[groups]]
            name = "controllers"
            pattern = 'Controller/'

            [[groups]]
            name = "broken"
            pattern = '(unclosed'
            "#,
        )
        .unwrap();

        assert_eq!(rules.extensions, vec!["php", "twig"]);
        assert!(rules.select("src/Controller/HomeController.php"));
        assert!(!rules.select("src/Kernel.php"));
        assert!(rules.content_remove.is_empty());
        assert_eq!(rules.groups.len(), 1);
        assert!(rules.preamble.is_empty());
        assert!(rules.strip.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = RuleSet::from_toml_str("include = ['x']").unwrap_err();
        assert!(err.to_string().contains("Invalid rules TOML"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RuleSet::load(Path::new("/definitely/not/here/rules.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read rules file"));
    }
}
