//! fileminify - Pattern-based minifier for PHP, SQL, JavaScript, CSS and Vue files
//!
//! Minification is a fixed sequence of regular-expression passes per file kind:
//! comments are stripped, whitespace is collapsed and spaces around
//! punctuation are removed. There is no tokenizer, so comment markers inside
//! string literals are treated as comments.
//!
//! ## Modes
//!
//! - A single file is minified into an output directory.
//! - A directory tree is minified file by file, mirrored under the output
//!   directory, or concatenated into one combined file.
//! - Framework mode (Laravel by default, see `rules/laravel.toml`) keeps only
//!   files selected by include/exclude path patterns, removes boilerplate from
//!   them after minification and can bundle them grouped by role.

pub mod combine;
pub mod error;
pub mod kind;
pub mod minify;
pub mod patterns;
pub mod progress;
pub mod scanner;

// Re-export commonly used items
pub use combine::{combine, combine_by_kind, BundleStyle, Combined, GroupRule, GroupedFiles};
pub use error::ProcessError;
pub use kind::{FileKind, SUPPORTED_EXTENSIONS};
pub use minify::minify;
pub use patterns::{apply_content_cleanup, is_selected, PatternRole, PatternSet, RuleSet};
pub use progress::{BarProgress, Progress, SilentProgress};
pub use scanner::{process, FileReport, Mode, ProcessOptions, ProcessSummary};
