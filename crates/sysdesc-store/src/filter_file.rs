//! `@file` indirection in filter definitions.
//!
//! A matcher of the form `@path` stands for the lines of that file:
//!
//! ```text
//! /unmanaged_files/name=@/etc/sysdesc/skip-list
//! ```
//!
//! `\@` keeps a literal leading `@`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use sysdesc_core::errors::ExError;
use sysdesc_core::filter::{escape_matcher, split_definitions};
use sysdesc_core::Filter;

use crate::errors::{filter_file_missing, io_error_at, Result};

const FILE_PREFIX: char = '@';

/// Expand every `@path` matcher in `text`, resolving relative paths against
/// `base_dir`.
///
/// Returns definitions in the persisted form accepted by
/// [`Filter::from_definitions`]. A definition whose only matchers were empty
/// files is dropped.
///
/// # Errors
///
/// `FilterFileMissing` naming the path, `Io` if a file cannot be read,
/// `InvalidFilter` if `text` does not tokenize.
pub fn expand_filter_files(text: &str, base_dir: &Path) -> Result<Vec<String>> {
    let mut expanded = Vec::new();
    for definition in split_definitions(text).map_err(ExError::from)? {
        let Some((path, rest)) = definition.split_once('=') else {
            expanded.push(definition);
            continue;
        };
        let mut matchers = Vec::new();
        for matcher in split_raw_matchers(rest) {
            match matcher.strip_prefix(FILE_PREFIX) {
                Some(file) => matchers.extend(read_matchers(&base_dir.join(file))?),
                None => matchers.push(matcher),
            }
        }
        if !matchers.is_empty() || rest.is_empty() {
            expanded.push(format!("{}={}", path, matchers.join(",")));
        }
    }
    Ok(expanded)
}

/// Parse filter text, expanding `@path` matchers first.
///
/// # Errors
///
/// As [`expand_filter_files`], plus `InvalidFilter` for malformed
/// definitions.
pub fn load_filter(text: &str, base_dir: &Path) -> Result<Filter> {
    let definitions = expand_filter_files(text, base_dir)?;
    Filter::from_definitions(&definitions).map_err(ExError::from)
}

/// Split on unescaped commas, keeping escapes
fn split_raw_matchers(text: &str) -> Vec<String> {
    let mut matchers = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => matchers.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    matchers.push(current);
    matchers
}

fn read_matchers(path: &Path) -> Result<Vec<String>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(filter_file_missing(path)),
        Err(e) => return Err(io_error_at("expand_filter_files", path, e)),
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(escape_matcher)
        .collect())
}
