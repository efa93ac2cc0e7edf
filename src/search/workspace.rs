//! Filesystem-backed capabilities.
//!
//! References are whole-word textual matches across the workspace's source
//! files. Implementations are found from `implements`/`extends` clauses, or
//! from the type's own declaration when nothing implements it. Unsaved text
//! can be layered over the disk contents per file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use regex::Regex;

use super::{DocumentAccess, FileSearch, SymbolSearch};
use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};
use crate::types::{Location, SourcePosition, SourceRange};

pub struct WorkspaceSearch {
    root: PathBuf,
    extensions: Vec<String>,
    ignore_patterns: Vec<String>,
    overlays: DashMap<PathBuf, String>,
}

impl WorkspaceSearch {
    pub fn new(root: impl Into<PathBuf>, config: &SearchConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config.source_extensions.clone(),
            ignore_patterns: config.ignore_patterns.clone(),
            overlays: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve `text` for `path` instead of the file on disk.
    pub fn set_overlay(&self, path: impl Into<PathBuf>, text: String) {
        self.overlays.insert(self.absolute(&path.into()), text);
    }

    pub fn clear_overlay(&self, path: &Path) {
        self.overlays.remove(&self.absolute(path));
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    async fn read(&self, path: &Path) -> SearchResult<String> {
        let path = self.absolute(path);
        if let Some(text) = self.overlays.get(&path) {
            return Ok(text.clone());
        }
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => SearchError::DocumentNotFound(path.clone()),
                _ => SearchError::Io {
                    path: path.clone(),
                    source,
                },
            })
    }

    /// Every source file under the root plus overlay-only documents, sorted.
    async fn source_files(&self) -> SearchResult<Vec<PathBuf>> {
        let root = self.root.clone();
        let extensions = self.extensions.clone();
        let ignore_patterns = self.ignore_patterns.clone();
        let mut files =
            tokio::task::spawn_blocking(move || walk(&root, &extensions, &ignore_patterns))
                .await?;

        for overlay in self.overlays.iter() {
            if !files.contains(overlay.key()) {
                files.push(overlay.key().clone());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn identifier(&self, document: &Path, position: SourcePosition) -> SearchResult<String> {
        let text = self.read(document).await?;
        identifier_at(&text, position)
            .map(str::to_string)
            .ok_or_else(|| SearchError::NoIdentifier {
                path: document.to_path_buf(),
                position,
            })
    }

    /// Read each source file, skipping unreadable ones.
    async fn for_each_source(&self, mut visit: impl FnMut(&Path, &str)) -> SearchResult<()> {
        for file in self.source_files().await? {
            match self.read(&file).await {
                Ok(text) => visit(&file, &text),
                Err(e) => tracing::warn!("[workspace] skipping unreadable file: {e}"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SymbolSearch for WorkspaceSearch {
    async fn find_references(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>> {
        let name = self.identifier(document, position).await?;
        let mut found = Vec::new();
        self.for_each_source(|file, text| {
            for (idx, line) in text.lines().enumerate() {
                for column in word_occurrences(line, &name) {
                    found.push(Location::new(
                        file,
                        SourceRange::on_line(idx as u32, column, name.len()),
                    ));
                }
            }
        })
        .await?;

        crate::debug_event!("workspace", "references", "{name}: {}", found.len());
        Ok(found)
    }

    async fn find_implementations(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>> {
        let name = self.identifier(document, position).await?;
        let escaped = regex::escape(&name);
        let implementor = Regex::new(&format!(
            r"\b(?:class|enum|record)\s+(\w+)[^{{]*\b(?:implements|extends)\b[^{{]*\b{escaped}\b"
        ))
        .map_err(|e| SearchError::InvalidPattern {
            pattern: name.clone(),
            reason: e.to_string(),
        })?;
        let declaration = Regex::new(&format!(r"\b(?:class|enum|record)\s+({escaped})\b")).map_err(
            |e| SearchError::InvalidPattern {
                pattern: name.clone(),
                reason: e.to_string(),
            },
        )?;

        let mut implementors = Vec::new();
        let mut declarations = Vec::new();
        self.for_each_source(|file, text| {
            for (idx, line) in text.lines().enumerate() {
                if let Some(m) = implementor.captures(line).and_then(|c| c.get(1)) {
                    implementors.push(Location::new(
                        file,
                        SourceRange::on_line(idx as u32, m.start(), m.len()),
                    ));
                } else if let Some(m) = declaration.captures(line).and_then(|c| c.get(1)) {
                    declarations.push(Location::new(
                        file,
                        SourceRange::on_line(idx as u32, m.start(), m.len()),
                    ));
                }
            }
        })
        .await?;

        crate::debug_event!(
            "workspace",
            "implementations",
            "{name}: {} implementors, {} declarations",
            implementors.len(),
            declarations.len()
        );
        Ok(if implementors.is_empty() {
            declarations
        } else {
            implementors
        })
    }
}

#[async_trait]
impl FileSearch for WorkspaceSearch {
    async fn find_files(
        &self,
        pattern: &str,
        exclude: Option<&str>,
        limit: usize,
    ) -> SearchResult<Vec<PathBuf>> {
        let include = compile_globs(pattern)?;
        let exclude = exclude.map(compile_globs).transpose()?.unwrap_or_default();

        let matched: Vec<PathBuf> = self
            .source_files()
            .await?
            .into_iter()
            .filter(|file| {
                let relative = file.strip_prefix(&self.root).unwrap_or(file);
                matches_any(&include, relative) && !matches_any(&exclude, relative)
            })
            .take(limit)
            .collect();
        Ok(matched)
    }
}

#[async_trait]
impl DocumentAccess for WorkspaceSearch {
    async fn open_document(&self, file: &Path) -> SearchResult<String> {
        self.read(file).await
    }
}

fn walk(root: &Path, extensions: &[String], ignore_patterns: &[String]) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .require_git(false);

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in ignore_patterns {
        if let Err(e) = overrides.add(&format!("!{pattern}")) {
            tracing::warn!("[workspace] invalid ignore pattern '{pattern}': {e}");
        }
    }
    match overrides.build() {
        Ok(overrides) => {
            builder.overrides(overrides);
        }
        Err(e) => tracing::warn!("[workspace] ignore patterns unusable: {e}"),
    }

    builder
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
        })
        .collect()
}

/// Identifier under a zero-based line/column.
pub fn identifier_at(text: &str, position: SourcePosition) -> Option<&str> {
    let line = text.lines().nth(position.line as usize)?;
    let column = position.column as usize;
    if column >= line.len() || !line.is_char_boundary(column) {
        return None;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    if !line[column..].chars().next().is_some_and(is_word) {
        return None;
    }
    let start = line[..column]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word(*c))
        .last()
        .map_or(column, |(idx, _)| idx);
    let end = line[column..]
        .char_indices()
        .find(|(_, c)| !is_word(*c))
        .map_or(line.len(), |(idx, _)| column + idx);
    Some(&line[start..end])
}

/// Byte columns where `word` occurs delimited by non-identifier characters.
pub fn word_occurrences<'a>(line: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    line.match_indices(word).filter_map(move |(idx, _)| {
        let before = line[..idx].chars().next_back();
        let after = line[idx + word.len()..].chars().next();
        let bounded = before.is_none_or(|c| !is_word(c)) && after.is_none_or(|c| !is_word(c));
        bounded.then_some(idx)
    })
}

/// Expand the first `{a,b}` group, recursively.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(close) = pattern[open..].find('}').map(|offset| open + offset) else {
        return vec![pattern.to_string()];
    };
    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    pattern[open + 1..close]
        .split(',')
        .flat_map(|alternative| expand_braces(&format!("{head}{alternative}{tail}")))
        .collect()
}

fn compile_globs(pattern: &str) -> SearchResult<Vec<Pattern>> {
    expand_braces(pattern)
        .iter()
        .map(|expanded| {
            Pattern::new(expanded).map_err(|e| SearchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    patterns
        .iter()
        .any(|pattern| pattern.matches_path_with(path, options))
}
