//! Source discovery and per-mode processing.

use crate::combine::{bundle_header, combine_by_kind, BundleStyle, GroupedFiles};
use crate::error::ProcessError;
use crate::kind::FileKind;
use crate::minify::minify;
use crate::patterns::RuleSet;
use crate::progress::Progress;

use chrono::Local;
use ignore::WalkBuilder;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// VCS metadata directories that are never walked
pub const VCS_INTERNALS: &[&str] = &[
    ".git", ".jj", ".svn", ".hg", ".bzr", "_darcs", ".pijul", "CVS", ".fossil",
];

/// Directory outputs land in when no output path is given
pub const DEFAULT_OUTPUT_DIR: &str = "minified";

/// What to do with a source path (runtime flags)
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Concatenate every result into a single file
    pub combine: bool,
    /// Apply the rule set's selection and cleanup
    pub framework: bool,
    /// Output directory, or output file for combined modes
    pub output: Option<PathBuf>,
}

/// Which processing path a run took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    File,
    Directory,
    CombinedDirectory,
    Framework,
    CombinedFramework,
}

/// Size report for one minified file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    /// Path relative to the source root, `/`-separated
    pub relative: String,
    pub original_size: u64,
    pub minified_size: u64,
}

impl FileReport {
    pub fn saved(&self) -> u64 {
        self.original_size.saturating_sub(self.minified_size)
    }

    pub fn saved_percent(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.saved() as f64 / self.original_size as f64 * 100.0
        }
    }
}

/// Outcome of a processing run
#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub mode: Mode,
    /// Output file for single-file and combined runs, output directory otherwise
    pub output: PathBuf,
    /// Supported files discovered (in framework mode, files with the rule set's extensions)
    pub total_files: usize,
    pub minified: usize,
    /// Files rejected by framework selection
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
    pub combined_size: Option<u64>,
    pub group_counts: Vec<(String, usize)>,
}

impl ProcessSummary {
    fn new(mode: Mode, output: PathBuf) -> Self {
        ProcessSummary {
            mode,
            output,
            total_files: 0,
            minified: 0,
            skipped: 0,
            failed: 0,
            files: Vec::new(),
            combined_size: None,
            group_counts: Vec::new(),
        }
    }

    fn record(&mut self, report: FileReport) {
        self.minified += 1;
        self.files.push(report);
    }

    pub fn bytes_saved(&self) -> u64 {
        self.files.iter().map(FileReport::saved).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// A supported file discovered under the source root
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative: String,
    pub kind: FileKind,
}

/// Minify `source` according to `options`.
///
/// A file is minified into the output directory. A directory is walked and
/// every supported file is minified, either mirrored under the output
/// directory or concatenated into one file when `options.combine` is set.
/// With `options.framework` only files selected by `rules` are processed.
pub fn process(
    source: &Path,
    options: &ProcessOptions,
    rules: &RuleSet,
    progress: &mut dyn Progress,
) -> Result<ProcessSummary, ProcessError> {
    if !source.exists() {
        return Err(ProcessError::SourceNotFound(source.to_path_buf()));
    }

    // Canonicalize so default output locations and relative paths are stable
    let source = source
        .canonicalize()
        .unwrap_or_else(|_| source.to_path_buf());
    let output = options.output.as_deref();

    debug!(
        source = %source.display(),
        combine = options.combine,
        framework = options.framework,
        "Processing"
    );

    match (source.is_dir(), options.framework, options.combine) {
        (false, true, _) => Err(ProcessError::NotADirectory(source)),
        (false, false, _) => process_file(&source, output),
        (true, false, false) => process_directory(&source, output, progress),
        (true, false, true) => process_directory_combined(&source, output, progress),
        (true, true, false) => process_framework(&source, output, rules, progress),
        (true, true, true) => process_framework_combined(&source, output, rules, progress),
    }
}

/// Minify one file into `output_dir` (default `<source dir>/minified`)
pub fn process_file(
    source: &Path,
    output_dir: Option<&Path>,
) -> Result<ProcessSummary, ProcessError> {
    let kind = FileKind::from_path(source).ok_or_else(|| ProcessError::UnsupportedKind {
        path: source.to_path_buf(),
        extension: source
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;

    let file_name = source
        .file_name()
        .ok_or_else(|| ProcessError::SourceNotFound(source.to_path_buf()))?;

    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => source
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_OUTPUT_DIR),
    };
    let dest = output_dir.join(file_name);

    let file = SourceFile {
        path: source.to_path_buf(),
        relative: file_name.to_string_lossy().into_owned(),
        kind,
    };
    let report = minify_to(&file, None, &dest)?;

    let mut summary = ProcessSummary::new(Mode::File, dest);
    summary.total_files = 1;
    summary.record(report);
    Ok(summary)
}

/// Minify every supported file, mirroring the tree under the output directory
pub fn process_directory(
    source: &Path,
    output_dir: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<ProcessSummary, ProcessError> {
    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_root(source));

    let files = collect_files(source, &output_dir, |_| true)?;
    if files.is_empty() {
        return Err(ProcessError::NoSupportedFiles(source.to_path_buf()));
    }

    create_dir(&output_dir)?;

    let mut summary = ProcessSummary::new(Mode::Directory, output_dir.clone());
    summary.total_files = files.len();
    progress.begin(files.len());

    for file in &files {
        let dest = output_dir.join(&file.relative);
        match minify_to(file, None, &dest) {
            Ok(report) => summary.record(report),
            Err(err) => {
                warn!("{}", err);
                summary.failed += 1;
            }
        }
        progress.advance(&file.relative);
    }

    progress.finish();
    Ok(summary)
}

/// Minify every supported file and concatenate the results, grouped by kind
pub fn process_directory_combined(
    source: &Path,
    output_file: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<ProcessSummary, ProcessError> {
    let output_file = output_file.map(Path::to_path_buf).unwrap_or_else(|| {
        let dir_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_string());
        default_output_root(source).join(format!("{}.combined.min.js", dir_name))
    });

    let files = collect_files(source, &output_file, |_| true)?;
    if files.is_empty() {
        return Err(ProcessError::NoSupportedFiles(source.to_path_buf()));
    }

    let mut summary = ProcessSummary::new(Mode::CombinedDirectory, output_file.clone());
    summary.total_files = files.len();
    progress.begin(files.len());

    let mut minified = Vec::with_capacity(files.len());
    for file in &files {
        match minify_source(file, None) {
            Ok((content, report)) => {
                minified.push((file.relative.clone(), file.kind, content));
                summary.record(report);
            }
            Err(err) => {
                warn!("{}", err);
                summary.failed += 1;
            }
        }
        progress.advance(&file.relative);
    }
    progress.finish();

    let text = combine_by_kind(minified);
    write_output(&output_file, &text)?;
    summary.combined_size = Some(text.len() as u64);

    Ok(summary)
}

/// Minify and clean the files selected by `rules`, mirroring the tree
pub fn process_framework(
    source: &Path,
    output_dir: Option<&Path>,
    rules: &RuleSet,
    progress: &mut dyn Progress,
) -> Result<ProcessSummary, ProcessError> {
    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_root(source));

    let files = collect_files(source, &output_dir, |path| rules.handles(path))?;
    if files.is_empty() {
        return Err(ProcessError::NoSupportedFiles(source.to_path_buf()));
    }

    create_dir(&output_dir)?;

    let mut summary = ProcessSummary::new(Mode::Framework, output_dir.clone());
    summary.total_files = files.len();
    progress.begin(files.len());

    for file in &files {
        if rules.select(&file.relative) {
            let dest = output_dir.join(&file.relative);
            match minify_to(file, Some(rules), &dest) {
                Ok(report) => summary.record(report),
                Err(err) => {
                    warn!("{}", err);
                    summary.failed += 1;
                }
            }
        } else {
            debug!(path = %file.relative, rules = %rules.name, "Not selected, skipping");
            summary.skipped += 1;
        }
        progress.advance(&file.relative);
    }

    progress.finish();
    Ok(summary)
}

/// Minify and clean the files selected by `rules` into one grouped bundle
pub fn process_framework_combined(
    source: &Path,
    output_file: Option<&Path>,
    rules: &RuleSet,
    progress: &mut dyn Progress,
) -> Result<ProcessSummary, ProcessError> {
    let output_file = output_file.map(Path::to_path_buf).unwrap_or_else(|| {
        default_output_root(source).join(format!(
            "combined.{}.{}",
            rules.name,
            rules.bundle_extension()
        ))
    });

    let files = collect_files(source, &output_file, |path| rules.handles(path))?;
    if files.is_empty() {
        return Err(ProcessError::NoSupportedFiles(source.to_path_buf()));
    }

    let mut summary = ProcessSummary::new(Mode::CombinedFramework, output_file.clone());
    summary.total_files = files.len();
    progress.begin(files.len());

    let mut grouped = GroupedFiles::new(&rules.groups);
    for file in &files {
        if rules.select(&file.relative) {
            match minify_source(file, Some(rules)) {
                Ok((content, report)) => {
                    let group = grouped.insert(file.relative.clone(), content);
                    debug!(path = %file.relative, group, "Grouped");
                    summary.record(report);
                }
                Err(err) => {
                    warn!("{}", err);
                    summary.failed += 1;
                }
            }
        } else {
            debug!(path = %file.relative, rules = %rules.name, "Not selected, skipping");
            summary.skipped += 1;
        }
        progress.advance(&file.relative);
    }
    progress.finish();

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let header = bundle_header(&rules.name, &timestamp);
    let combined = grouped.render(&BundleStyle {
        preamble: &rules.preamble,
        header: &header,
        strip: Some(&rules.strip),
    });

    write_output(&output_file, &combined.text)?;
    summary.combined_size = Some(combined.text.len() as u64);
    summary.group_counts = combined.counts;

    Ok(summary)
}

/// Collect supported files under `root` in file-name order.
///
/// Hidden files are included; VCS internals and anything under `skip` (the
/// output location) are never visited. `accept` further filters candidates.
pub fn collect_files<F>(root: &Path, skip: &Path, accept: F) -> Result<Vec<SourceFile>, ProcessError>
where
    F: Fn(&Path) -> bool,
{
    fs::read_dir(root).map_err(|source| ProcessError::Walk {
        path: root.to_path_buf(),
        source,
    })?;

    let skip = absolute_path(skip);

    let walker = WalkBuilder::new(root)
        .hidden(false)
        // Every file is a candidate, ignore files play no part in selection
        .git_ignore(false)
        .ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let path = entry.path();

            if entry.depth() == 0 {
                return true;
            }

            // Never traverse VCS internals
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if VCS_INTERNALS.contains(&name) {
                    return false;
                }
            }

            // Never read back our own output
            !path.starts_with(&skip)
        })
        .build();

    let mut files = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to access entry in {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(kind) = FileKind::from_path(path) else {
            continue;
        };
        if !accept(path) {
            continue;
        }

        files.push(SourceFile {
            path: path.to_path_buf(),
            relative: relative_path(path, root),
            kind,
        });
    }

    debug!(root = %root.display(), count = files.len(), "Collected files");
    Ok(files)
}

/// Path of `path` relative to `root`, always `/`-separated
pub fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `<parent of source>/minified`
pub fn default_output_root(source: &Path) -> PathBuf {
    match source.parent() {
        Some(parent) => parent.join(DEFAULT_OUTPUT_DIR),
        None => source.join(DEFAULT_OUTPUT_DIR),
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn read_source(path: &Path) -> Result<(String, u64), ProcessError> {
    let bytes = fs::read(path).map_err(|source| ProcessError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let size = bytes.len() as u64;
    Ok((String::from_utf8_lossy(&bytes).into_owned(), size))
}

fn create_dir(path: &Path) -> Result<(), ProcessError> {
    fs::create_dir_all(path).map_err(|source| ProcessError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_output(path: &Path, content: &str) -> Result<(), ProcessError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent)?;
    }
    fs::write(path, content).map_err(|source| ProcessError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, minify and (with `rules`) clean one file
fn minify_source(
    file: &SourceFile,
    rules: Option<&RuleSet>,
) -> Result<(String, FileReport), ProcessError> {
    let (text, original_size) = read_source(&file.path)?;

    let mut content = minify(file.kind, &text);
    if let Some(rules) = rules {
        content = rules.clean(&content);
    }

    let report = FileReport {
        source: file.path.clone(),
        relative: file.relative.clone(),
        original_size,
        minified_size: content.len() as u64,
    };
    Ok((content, report))
}

fn minify_to(
    file: &SourceFile,
    rules: Option<&RuleSet>,
    dest: &Path,
) -> Result<FileReport, ProcessError> {
    let (content, report) = minify_source(file, rules)?;
    write_output(dest, &content)?;
    debug!(
        path = %file.relative,
        original = report.original_size,
        minified = report.minified_size,
        "Minified"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/project/app");
        let path = root.join("Http").join("Controllers").join("UserController.php");
        assert_eq!(
            relative_path(&path, root),
            "Http/Controllers/UserController.php"
        );
    }

    #[test]
    fn test_relative_path_outside_root() {
        assert_eq!(
            relative_path(Path::new("other/file.js"), Path::new("/root")),
            "other/file.js"
        );
    }

    #[test]
    fn test_default_output_root() {
        assert_eq!(
            default_output_root(Path::new("/project/app")),
            PathBuf::from("/project/minified")
        );
        assert_eq!(
            default_output_root(Path::new("/")),
            PathBuf::from("/minified")
        );
    }

    #[test]
    fn test_file_report_savings() {
        let report = FileReport {
            source: PathBuf::from("a.js"),
            relative: "a.js".to_string(),
            original_size: 200,
            minified_size: 50,
        };
        assert_eq!(report.saved(), 150);
        assert!((report.saved_percent() - 75.0).abs() < f64::EPSILON);

        let empty = FileReport {
            original_size: 0,
            minified_size: 0,
            ..report
        };
        assert_eq!(empty.saved(), 0);
        assert_eq!(empty.saved_percent(), 0.0);
    }

    #[test]
    fn test_collect_files_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();

        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("out")).unwrap();
        fs::write(root.join("b/z.css"), "a{}").unwrap();
        fs::write(root.join("b/a.js"), "x").unwrap();
        fs::write(root.join("a.php"), "<?php").unwrap();
        fs::write(root.join(".hidden.js"), "y").unwrap();
        fs::write(root.join("notes.txt"), "skip").unwrap();
        fs::write(root.join(".git/hook.js"), "skip").unwrap();
        fs::write(root.join("out/old.js"), "skip").unwrap();

        let files = collect_files(&root, &root.join("out"), |_| true).unwrap();
        let relative: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();

        assert_eq!(relative, vec![".hidden.js", "a.php", "b/a.js", "b/z.css"]);
        assert_eq!(files[3].kind, FileKind::Style);
    }

    #[test]
    fn test_collect_files_accept_filter() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::write(root.join("a.php"), "").unwrap();
        fs::write(root.join("b.js"), "").unwrap();

        let files = collect_files(&root, &root.join("minified"), |path| {
            path.extension().is_some_and(|ext| ext == "php")
        })
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "a.php");
    }

    #[test]
    fn test_collect_files_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = collect_files(&missing, &tmp.path().join("out"), |_| true).unwrap_err();
        assert!(matches!(err, ProcessError::Walk { .. }));
    }
}
