//! Grouping and ordering of minified files into one combined artifact.

use crate::kind::FileKind;
use crate::patterns::PatternSet;

use regex::Regex;

/// Name of the implicit group that catches files no rule matched
pub const CATCH_ALL_GROUP: &str = "other";

/// Separator placed between chunks of a combined artifact
pub const CHUNK_SEPARATOR: &str = "\n";

/// A named path predicate deciding group membership
#[derive(Debug, Clone)]
pub struct GroupRule {
    pub name: String,
    pattern: Regex,
}

impl GroupRule {
    pub fn new(name: impl Into<String>, pattern: Regex) -> Self {
        GroupRule {
            name: name.into(),
            pattern,
        }
    }

    pub fn matches(&self, relative_path: &str) -> bool {
        self.pattern.is_match(relative_path)
    }
}

/// A named bucket of `(relative path, minified content)` pairs in discovery order
#[derive(Debug, Clone, Default)]
pub struct FileGroup {
    pub name: String,
    pub files: Vec<(String, String)>,
}

/// Single-line label comment placed before each file body
pub fn file_label(relative_path: &str) -> String {
    format!("/* File: {} */", relative_path)
}

/// Ordered text chunks that become one output file
#[derive(Debug, Clone, Default)]
pub struct CombinedArtifact {
    chunks: Vec<String>,
}

impl CombinedArtifact {
    pub fn new() -> Self {
        CombinedArtifact::default()
    }

    pub fn push(&mut self, chunk: impl Into<String>) {
        self.chunks.push(chunk.into());
    }

    /// Append a labelled file body
    pub fn push_file(&mut self, relative_path: &str, content: &str) {
        self.push(file_label(relative_path));
        self.push(content);
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn render(&self) -> String {
        self.chunks.join(CHUNK_SEPARATOR)
    }
}

/// Framing around the grouped bodies of a combined bundle
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleStyle<'a> {
    /// Opens the bundle, e.g. `<?php\n`
    pub preamble: &'a str,
    /// Comment block emitted right after the preamble
    pub header: &'a str,
    /// Removed from every file body before it is appended
    pub strip: Option<&'a PatternSet>,
}

/// Result of combining: the artifact text and how many files landed in each group
#[derive(Debug, Clone)]
pub struct Combined {
    pub text: String,
    /// Every group in emission order, including empty ones
    pub counts: Vec<(String, usize)>,
}

/// Files bucketed by the first matching rule, emitted in rule order
#[derive(Debug, Clone)]
pub struct GroupedFiles {
    rules: Vec<GroupRule>,
    groups: Vec<FileGroup>,
    catch_all: usize,
}

impl GroupedFiles {
    pub fn new(rules: &[GroupRule]) -> Self {
        let mut groups: Vec<FileGroup> = rules
            .iter()
            .map(|rule| FileGroup {
                name: rule.name.clone(),
                files: Vec::new(),
            })
            .collect();

        // A rule set may name its own "other" group; reuse it as the catch-all
        let catch_all = match groups.iter().position(|g| g.name == CATCH_ALL_GROUP) {
            Some(index) => index,
            None => {
                groups.push(FileGroup {
                    name: CATCH_ALL_GROUP.to_string(),
                    files: Vec::new(),
                });
                groups.len() - 1
            }
        };

        GroupedFiles {
            rules: rules.to_vec(),
            groups,
            catch_all,
        }
    }

    /// Index of the group a path belongs to
    fn classify(&self, relative_path: &str) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.matches(relative_path))
            .unwrap_or(self.catch_all)
    }

    /// Add a file, returning the name of the group it landed in
    pub fn insert(&mut self, relative_path: String, content: String) -> &str {
        let index = self.classify(&relative_path);
        let group = &mut self.groups[index];
        group.files.push((relative_path, content));
        &group.name
    }

    pub fn groups(&self) -> &[FileGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> Vec<(String, usize)> {
        self.groups
            .iter()
            .map(|g| (g.name.clone(), g.files.len()))
            .collect()
    }

    /// Render the bundle: preamble, header, then each non-empty group as a
    /// `// <group>` line followed by labelled file bodies
    pub fn render(&self, style: &BundleStyle<'_>) -> Combined {
        let mut artifact = CombinedArtifact::new();

        if !style.preamble.is_empty() {
            artifact.push(style.preamble);
        }
        if !style.header.is_empty() {
            artifact.push(style.header);
        }

        for group in self.groups.iter().filter(|g| !g.files.is_empty()) {
            artifact.push(format!("\n// {}\n", group.name));
            for (path, content) in &group.files {
                match style.strip {
                    Some(strip) => artifact.push_file(path, &strip.strip(content)),
                    None => artifact.push_file(path, content),
                }
            }
        }

        Combined {
            text: artifact.render(),
            counts: self.counts(),
        }
    }
}

/// Group files with `rules` and render them as one bundle
pub fn combine<I>(files: I, rules: &[GroupRule], style: &BundleStyle<'_>) -> Combined
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped = GroupedFiles::new(rules);
    for (path, content) in files {
        grouped.insert(path, content);
    }
    grouped.render(style)
}

/// Concatenate files grouped by kind, kinds in first-seen order
pub fn combine_by_kind<I>(files: I) -> String
where
    I: IntoIterator<Item = (String, FileKind, String)>,
{
    let mut buckets: Vec<(FileKind, Vec<(String, String)>)> = Vec::new();

    for (path, kind, content) in files {
        match buckets.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, bucket)) => bucket.push((path, content)),
            None => buckets.push((kind, vec![(path, content)])),
        }
    }

    let mut artifact = CombinedArtifact::new();
    for (_, bucket) in &buckets {
        for (path, content) in bucket {
            artifact.push_file(path, content);
        }
    }
    artifact.render()
}

/// Comment block identifying a generated bundle
pub fn bundle_header(rule_set: &str, timestamp: &str) -> String {
    format!(
        "/**\n * Combined {} files - generated by fileminify\n * Date: {}\n */",
        rule_set, timestamp
    )
}
