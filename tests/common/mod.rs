//! In-memory capabilities for deterministic resolver tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use beanscope::analysis::line::class_declaration;
use beanscope::search::{expand_braces, identifier_at, word_occurrences};
use beanscope::{
    Analyzer, DocumentAccess, FileSearch, Location, SearchError, SearchResult, Settings,
    SourcePosition, SourceRange, SymbolSearch,
};

/// Files held in memory. The failing variant errors on every call.
#[derive(Default)]
pub struct InMemoryWorkspace {
    files: BTreeMap<PathBuf, String>,
    failing: bool,
    opened: AtomicUsize,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(PathBuf::from(path), text.to_string());
        self
    }

    /// Number of successful `open_document` calls so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn analyzer(self) -> Analyzer {
        Analyzer::new(Arc::new(self), Settings::default())
    }

    fn available(&self) -> SearchResult<()> {
        if self.failing {
            Err(SearchError::Task("index unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn text(&self, path: &Path) -> SearchResult<&String> {
        self.files
            .get(path)
            .ok_or_else(|| SearchError::DocumentNotFound(path.to_path_buf()))
    }

    fn name_at(&self, document: &Path, position: SourcePosition) -> SearchResult<String> {
        identifier_at(self.text(document)?, position)
            .map(str::to_string)
            .ok_or_else(|| SearchError::NoIdentifier {
                path: document.to_path_buf(),
                position,
            })
    }
}

#[async_trait]
impl SymbolSearch for InMemoryWorkspace {
    async fn find_references(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>> {
        self.available()?;
        let name = self.name_at(document, position)?;
        let mut found = Vec::new();
        for (path, text) in &self.files {
            for (idx, line) in text.lines().enumerate() {
                for column in word_occurrences(line, &name) {
                    found.push(Location::new(
                        path,
                        SourceRange::on_line(idx as u32, column, name.len()),
                    ));
                }
            }
        }
        Ok(found)
    }

    async fn find_implementations(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>> {
        self.available()?;
        let name = self.name_at(document, position)?;
        let mut implementors = Vec::new();
        let mut declarations = Vec::new();
        for (path, text) in &self.files {
            for (idx, line) in text.lines().enumerate() {
                let Some(class) = class_declaration(line) else {
                    continue;
                };
                let location = Location::new(
                    path,
                    SourceRange::on_line(idx as u32, class.column, class.text.len()),
                );
                let implements = line
                    .find(" implements ")
                    .is_some_and(|at| word_occurrences(&line[at..], &name).next().is_some());
                if implements {
                    implementors.push(location);
                } else if class.text == name && line.contains("class ") {
                    declarations.push(location);
                }
            }
        }
        Ok(if implementors.is_empty() {
            declarations
        } else {
            implementors
        })
    }
}

#[async_trait]
impl FileSearch for InMemoryWorkspace {
    async fn find_files(
        &self,
        pattern: &str,
        exclude: Option<&str>,
        limit: usize,
    ) -> SearchResult<Vec<PathBuf>> {
        self.available()?;
        let compile = |pattern: &str| -> Vec<glob::Pattern> {
            expand_braces(pattern)
                .iter()
                .filter_map(|p| glob::Pattern::new(p).ok())
                .collect()
        };
        let include = compile(pattern);
        let exclude = exclude.map(compile).unwrap_or_default();
        Ok(self
            .files
            .keys()
            .filter(|path| include.iter().any(|p| p.matches_path(path)))
            .filter(|path| !exclude.iter().any(|p| p.matches_path(path)))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DocumentAccess for InMemoryWorkspace {
    async fn open_document(&self, file: &Path) -> SearchResult<String> {
        self.available()?;
        let text = self.text(file)?.clone();
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(text)
    }
}

pub const ORDER_SERVICE: &str = r#"package shop;

@Service
@RequiredArgsConstructor
public class OrderService {
    private final OrderRepository repository;
    private static final int LIMIT = 10;

    @Autowired
    @Qualifier("fast")
    private PaymentGateway gateway;

    @Autowired
    public OrderService(@Qualifier("audit") AuditLog auditLog,
                        Clock clock) {
    }
}
"#;
