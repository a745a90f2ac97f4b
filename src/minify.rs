//! Per-kind minification transforms.
//!
//! Every transform is a pure, total function made of ordered regex passes:
//! comments are stripped first, then whitespace is collapsed, then the spaces
//! around a per-kind set of punctuation characters are removed. There is no
//! tokenizer, so comment markers inside string, regex or template literals are
//! stripped exactly like real comments.

use crate::kind::FileKind;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `//` line comments and `/* */` block comments in a single left-to-right scan.
/// An unterminated block comment runs to the end of the text.
static SLASH_COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//.*|/\*[\s\S]*?(?:\*/|\z)").unwrap());

/// `--` line comments and `/* */` block comments
static SQL_COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--.*|/\*[\s\S]*?(?:\*/|\z)").unwrap());

static BLOCK_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?(?:\*/|\z)").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static GENERIC_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([(){}\[\],;:=><])\s*").unwrap());

static SCRIPT_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([=+\-*/%&|^!<>{}()\[\];:,.])\s*").unwrap());

// No word boundary: `elseif(` also gains a space, same as the other keywords.
static KEYWORD_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(if|else|for|while|switch|catch|function)\(").unwrap());

static STYLE_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*:\s*").unwrap());
static STYLE_OPEN_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\{\s*").unwrap());
static STYLE_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([{};,])\s*").unwrap());
static STYLE_TRAILING_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*\}").unwrap());

static TEMPLATE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<template>\s*").unwrap());
static TEMPLATE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*</template>").unwrap());
static BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<script>(.*?)</script>").unwrap());
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<style[^>]*>(.*?)</style>").unwrap());

/// Minify `text` with the transform for `kind`
pub fn minify(kind: FileKind, text: &str) -> String {
    match kind {
        FileKind::GenericSource => minify_generic_source(text),
        FileKind::StructuredQuery => minify_structured_query(text),
        FileKind::Script => minify_script(text),
        FileKind::Style => minify_style(text),
        FileKind::CompositeMarkup => minify_composite_markup(text),
    }
}

/// PHP-style source: strip comments, collapse whitespace, tighten punctuation
pub fn minify_generic_source(text: &str) -> String {
    let content = SLASH_COMMENTS.replace_all(text, "");
    let content = WHITESPACE.replace_all(&content, " ");
    let content = GENERIC_PUNCTUATION.replace_all(&content, "${1}");
    content.trim().to_string()
}

/// SQL: strip comments and collapse whitespace.
///
/// Spacing around operators is left alone, so `status = 'active'` keeps its
/// spaces.
pub fn minify_structured_query(text: &str) -> String {
    let content = SQL_COMMENTS.replace_all(text, "");
    let content = WHITESPACE.replace_all(&content, " ");
    content.trim().to_string()
}

/// JavaScript: strip comments, join trimmed lines without separators, collapse
/// remaining whitespace runs, tighten operators, then restore one space between control keywords and `(`.
///
/// Lines are joined with no separator at all, so code relying on automatic
/// semicolon insertion can be merged into a single statement.
pub fn minify_script(text: &str) -> String {
    let content = SLASH_COMMENTS.replace_all(text, "");
    let content: String = content.lines().map(str::trim).collect();
    let content = WHITESPACE.replace_all(&content, " ");
    let content = SCRIPT_PUNCTUATION.replace_all(&content, "${1}");
    let content = KEYWORD_PAREN.replace_all(&content, "${1} (");
    content.trim().to_string()
}

/// CSS: strip block comments, collapse whitespace, tighten `: { } ; ,` and
/// drop the last semicolon of each block.
pub fn minify_style(text: &str) -> String {
    let content = BLOCK_COMMENTS.replace_all(text, "");
    let content = STYLE_COLON.replace_all(&content, ":");
    let content = STYLE_OPEN_BRACE.replace_all(&content, "{");
    let content = WHITESPACE.replace_all(&content, " ");
    let content = STYLE_PUNCTUATION.replace_all(&content, "${1}");
    let content = STYLE_TRAILING_SEMICOLON.replace_all(&content, "}");
    content.trim().to_string()
}

/// Vue single-file component.
///
/// Markup only loses whitespace between tags and just inside `<template>`;
/// text content keeps its formatting. The first `<script>` block goes through
/// [`minify_script`] and the first `<style>` block through [`minify_style`].
/// Style tag attributes such as `scoped` are dropped.
pub fn minify_composite_markup(text: &str) -> String {
    let content = TEMPLATE_OPEN.replace_all(text, "<template>");
    let content = TEMPLATE_CLOSE.replace_all(&content, "</template>");
    let content = BETWEEN_TAGS.replace_all(&content, "><");

    let content = SCRIPT_BLOCK.replacen(&content, 1, |caps: &Captures| {
        format!("<script>{}</script>", minify_script(&caps[1]))
    });
    let content = STYLE_BLOCK.replacen(&content, 1, |caps: &Captures| {
        format!("<style>{}</style>", minify_style(&caps[1]))
    });

    content.trim().to_string()
}
