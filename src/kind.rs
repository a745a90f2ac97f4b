//! File kinds and extension lookup.

use std::fmt;
use std::path::Path;

/// Extensions the minifier knows how to handle, in lookup order
pub const SUPPORTED_EXTENSIONS: &[&str] = &["php", "sql", "js", "vue", "css"];

/// The category of a source file, which selects the transform applied to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// PHP and other `//` + `/* */` languages
    GenericSource,
    /// SQL
    StructuredQuery,
    /// JavaScript
    Script,
    /// CSS
    Style,
    /// Vue single-file components (template + script + style)
    CompositeMarkup,
}

impl FileKind {
    /// Look up the kind for a file extension (case-insensitive, without the dot)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "php" => Some(FileKind::GenericSource),
            "sql" => Some(FileKind::StructuredQuery),
            "js" => Some(FileKind::Script),
            "css" => Some(FileKind::Style),
            "vue" => Some(FileKind::CompositeMarkup),
            _ => None,
        }
    }

    /// Look up the kind for a path by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileKind::from_extension)
    }

    /// Canonical extension for this kind
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::GenericSource => "php",
            FileKind::StructuredQuery => "sql",
            FileKind::Script => "js",
            FileKind::Style => "css",
            FileKind::CompositeMarkup => "vue",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileKind::from_extension("php"), Some(FileKind::GenericSource));
        assert_eq!(FileKind::from_extension("sql"), Some(FileKind::StructuredQuery));
        assert_eq!(FileKind::from_extension("js"), Some(FileKind::Script));
        assert_eq!(FileKind::from_extension("css"), Some(FileKind::Style));
        assert_eq!(FileKind::from_extension("vue"), Some(FileKind::CompositeMarkup));
        assert_eq!(FileKind::from_extension("txt"), None);
        assert_eq!(FileKind::from_extension(""), None);
    }

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(FileKind::from_extension("PHP"), Some(FileKind::GenericSource));
        assert_eq!(FileKind::from_extension("Vue"), Some(FileKind::CompositeMarkup));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            FileKind::from_path(Path::new("app/Models/User.php")),
            Some(FileKind::GenericSource)
        );
        assert_eq!(
            FileKind::from_path(Path::new("resources/js/App.vue")),
            Some(FileKind::CompositeMarkup)
        );
        assert_eq!(FileKind::from_path(Path::new("README.md")), None);
        assert_eq!(FileKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_every_supported_extension_resolves() {
        for ext in SUPPORTED_EXTENSIONS {
            let kind = FileKind::from_extension(ext).unwrap();
            assert_eq!(kind.extension(), *ext);
        }
    }
}
