//! Usage filter: narrows raw textual references to genuine injection points.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::line::{Dialect, field_declaration, has_qualifier_marker, qualifier_literal};
use crate::config::AnalysisConfig;
use crate::search::{Capabilities, DocumentAccess, SymbolSearch};
use crate::types::{Location, SourcePosition};

/// A "find usages" request for one bean definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRequest {
    pub type_name: String,
    /// Document holding the bean definition.
    pub file: PathBuf,
    /// Line of the bean definition.
    pub line: u32,
    pub qualifier: Option<String>,
    pub is_primary: bool,
}

impl UsageRequest {
    pub fn new(type_name: impl Into<String>, file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            type_name: type_name.into(),
            file: file.into(),
            line,
            qualifier: None,
            is_primary: false,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Option<String>) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn with_primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }

    fn is_self_reference(&self, reference: &Location, window: u32) -> bool {
        reference.is_in(&self.file) && reference.line().abs_diff(self.line) <= window
    }
}

/// Result of a usage search. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageOutcome {
    /// The type name does not occur on the definition line.
    TypeNotFound,
    /// The symbol index knows no references at all.
    NoReferences,
    Found {
        locations: Vec<Location>,
        cancelled: bool,
    },
    NoInjectionPoints {
        cancelled: bool,
    },
}

impl UsageOutcome {
    pub fn locations(&self) -> &[Location] {
        match self {
            UsageOutcome::Found { locations, .. } => locations,
            _ => &[],
        }
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(
            self,
            UsageOutcome::Found { cancelled: true, .. }
                | UsageOutcome::NoInjectionPoints { cancelled: true }
        )
    }

    /// Neutral message for the presentation layer.
    pub fn message(&self, request: &UsageRequest) -> String {
        let type_name = &request.type_name;
        match self {
            UsageOutcome::TypeNotFound => format!("Could not find type {type_name}."),
            UsageOutcome::NoReferences => format!("No usages found for {type_name}."),
            UsageOutcome::Found { locations, .. } => {
                format!("{} injection point(s) found for {type_name}.", locations.len())
            }
            UsageOutcome::NoInjectionPoints { .. } => {
                let primary = if request.is_primary { "@Primary " } else { "" };
                let qualifier = request
                    .qualifier
                    .as_deref()
                    .map(|q| format!(" with @Qualifier(\"{q}\")"))
                    .unwrap_or_default();
                format!("No active injection points found for {primary}bean {type_name}{qualifier}.")
            }
        }
    }
}

/// Why a single reference was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceVerdict {
    Accepted,
    /// A field declaration with no injection evidence, or a line out of range.
    NotInjection,
    QualifierMismatch,
}

/// Filters references to a bean type down to injection points.
#[derive(Clone)]
pub struct UsageFilter {
    capabilities: Arc<dyn Capabilities>,
    dialect: Arc<Dialect>,
    config: AnalysisConfig,
}

impl UsageFilter {
    pub fn new(
        capabilities: Arc<dyn Capabilities>,
        dialect: Arc<Dialect>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            capabilities,
            dialect,
            config,
        }
    }

    /// Locate the type on its definition line, gather references and filter them.
    pub async fn find_usages(
        &self,
        request: &UsageRequest,
        cancel: &CancellationToken,
    ) -> UsageOutcome {
        let line_text = match self
            .capabilities
            .line_at(&request.file, request.line)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("[usages] cannot read definition line: {e}");
                return UsageOutcome::TypeNotFound;
            }
        };
        let Some(column) = line_text.find(&request.type_name) else {
            return UsageOutcome::TypeNotFound;
        };

        let position = SourcePosition::new(request.line, column as u32);
        let references = match self
            .capabilities
            .find_references(&request.file, position)
            .await
        {
            Ok(references) => references,
            Err(e) => {
                tracing::warn!("[usages] reference search failed: {e}");
                Vec::new()
            }
        };
        if references.is_empty() {
            return UsageOutcome::NoReferences;
        }

        self.filter_references(request, references, cancel).await
    }

    /// Keep the references that are injection points matching the request.
    ///
    /// Cancellation is checked before each reference; whatever was kept so far
    /// is returned.
    pub async fn filter_references(
        &self,
        request: &UsageRequest,
        references: Vec<Location>,
        cancel: &CancellationToken,
    ) -> UsageOutcome {
        let total = references.len();
        let mut documents: HashMap<PathBuf, Option<String>> = HashMap::new();
        let mut kept = Vec::new();
        let mut cancelled = false;

        for reference in references {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if request.is_self_reference(&reference, self.config.self_reference_window) {
                continue;
            }

            let text = self.document(&mut documents, &reference.path).await;
            let Some(text) = text else {
                continue;
            };
            let lines: Vec<&str> = text.lines().collect();
            let verdict = self.classify_reference(
                &lines,
                reference.line() as usize,
                request.qualifier.as_deref(),
            );
            if verdict == ReferenceVerdict::Accepted {
                kept.push(reference);
            }
        }

        crate::debug_event!(
            "usages",
            "filtered",
            "{} kept of {total} references to {}{}",
            kept.len(),
            request.type_name,
            if cancelled { " (cancelled)" } else { "" }
        );

        if kept.is_empty() {
            UsageOutcome::NoInjectionPoints { cancelled }
        } else {
            UsageOutcome::Found {
                locations: kept,
                cancelled,
            }
        }
    }

    /// Decide whether line `idx` of a document is an injection point.
    pub fn classify_reference(
        &self,
        lines: &[&str],
        idx: usize,
        required: Option<&str>,
    ) -> ReferenceVerdict {
        let Some(matched) = lines.get(idx) else {
            return ReferenceVerdict::NotInjection;
        };
        let start = idx.saturating_sub(self.config.usage_context_lines as usize);
        let context = lines[start..=idx].join("\n");

        if field_declaration(matched).is_some()
            && !self.dialect.is_usage_injection(&context)
            && !has_qualifier_marker(&context)
            && !self.has_convention_header(lines)
        {
            return ReferenceVerdict::NotInjection;
        }

        let keep = match required {
            Some(q) => qualifier_literal(&context) == Some(q),
            None => !has_qualifier_marker(&context),
        };
        if keep {
            ReferenceVerdict::Accepted
        } else {
            ReferenceVerdict::QualifierMismatch
        }
    }

    fn has_convention_header(&self, lines: &[&str]) -> bool {
        lines
            .iter()
            .take(self.config.header_lines as usize)
            .any(|text| self.dialect.is_convention_constructor(text))
    }

    async fn document<'m>(
        &self,
        documents: &'m mut HashMap<PathBuf, Option<String>>,
        path: &Path,
    ) -> Option<&'m String> {
        if !documents.contains_key(path) {
            let text = match self.capabilities.open_document(path).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("[usages] skipping {}: {e}", path.display());
                    None
                }
            };
            documents.insert(path.to_path_buf(), text);
        }
        documents.get(path).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceRange;

    struct NoCapabilities;

    #[async_trait::async_trait]
    impl crate::search::SymbolSearch for NoCapabilities {
        async fn find_references(
            &self,
            _document: &Path,
            _position: SourcePosition,
        ) -> crate::error::SearchResult<Vec<Location>> {
            Ok(Vec::new())
        }

        async fn find_implementations(
            &self,
            _document: &Path,
            _position: SourcePosition,
        ) -> crate::error::SearchResult<Vec<Location>> {
            Ok(Vec::new())
        }
    }

    #[async_trait::async_trait]
    impl crate::search::FileSearch for NoCapabilities {
        async fn find_files(
            &self,
            _pattern: &str,
            _exclude: Option<&str>,
            _limit: usize,
        ) -> crate::error::SearchResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    #[async_trait::async_trait]
    impl crate::search::DocumentAccess for NoCapabilities {
        async fn open_document(&self, file: &Path) -> crate::error::SearchResult<String> {
            Err(crate::error::SearchError::DocumentNotFound(file.to_path_buf()))
        }
    }

    fn filter() -> UsageFilter {
        UsageFilter::new(
            Arc::new(NoCapabilities),
            Arc::new(Dialect::default()),
            AnalysisConfig::default(),
        )
    }

    fn verdict(src: &str, idx: usize, required: Option<&str>) -> ReferenceVerdict {
        let lines: Vec<&str> = src.lines().collect();
        filter().classify_reference(&lines, idx, required)
    }

    #[test]
    fn test_field_without_evidence_is_rejected() {
        let src = "class A {\n    private Clock clock;\n    private OrderRepository repo;\n}";
        assert_eq!(verdict(src, 2, None), ReferenceVerdict::NotInjection);
    }

    #[test]
    fn test_annotated_field_is_accepted() {
        let src = "class A {\n    @Autowired\n    private OrderRepository repo;\n}";
        assert_eq!(verdict(src, 2, None), ReferenceVerdict::Accepted);

        let value = "class A {\n    @Value(\"${x}\")\n    private OrderRepository repo;\n}";
        assert_eq!(verdict(value, 2, None), ReferenceVerdict::Accepted);
    }

    #[test]
    fn test_convention_header_accepts_plain_field() {
        let src = "@Service\n@RequiredArgsConstructor\nclass A {\n    private final OrderRepository repo;\n}";
        assert_eq!(verdict(src, 3, None), ReferenceVerdict::Accepted);
    }

    #[test]
    fn test_non_field_reference_passes_field_check() {
        let src = "class A {\n    public A(OrderRepository repo) {\n    }\n}";
        assert_eq!(verdict(src, 1, None), ReferenceVerdict::Accepted);
    }

    #[test]
    fn test_qualifier_partition() {
        let src = "class A {\n    @Autowired\n    @Qualifier(\"fast\")\n    private PaymentGateway gw;\n}";
        assert_eq!(verdict(src, 3, Some("fast")), ReferenceVerdict::Accepted);
        assert_eq!(verdict(src, 3, Some("slow")), ReferenceVerdict::QualifierMismatch);
        assert_eq!(verdict(src, 3, None), ReferenceVerdict::QualifierMismatch);

        let plain = "class A {\n    @Autowired\n    private PaymentGateway gw;\n}";
        assert_eq!(verdict(plain, 2, Some("fast")), ReferenceVerdict::QualifierMismatch);
    }

    #[test]
    fn test_out_of_range_line_is_rejected() {
        assert_eq!(verdict("class A {}", 5, None), ReferenceVerdict::NotInjection);
    }

    #[test]
    fn test_self_reference_window() {
        let request = UsageRequest::new("Foo", "Foo.java", 10);
        let near = Location::new("Foo.java", SourceRange::on_line(12, 0, 3));
        let far = Location::new("Foo.java", SourceRange::on_line(13, 0, 3));
        let elsewhere = Location::new("Bar.java", SourceRange::on_line(10, 0, 3));
        assert!(request.is_self_reference(&near, 2));
        assert!(!request.is_self_reference(&far, 2));
        assert!(!request.is_self_reference(&elsewhere, 2));
    }

    #[test]
    fn test_empty_state_message_mentions_primary_and_qualifier() {
        let request = UsageRequest::new("PaymentGateway", "AppConfig.java", 4)
            .with_primary(true)
            .with_qualifier(Some("fast".into()));
        let outcome = UsageOutcome::NoInjectionPoints { cancelled: false };
        assert_eq!(
            outcome.message(&request),
            "No active injection points found for @Primary bean PaymentGateway with @Qualifier(\"fast\")."
        );
        assert!(outcome.locations().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_definition_line_is_type_not_found() {
        let request = UsageRequest::new("Foo", "Missing.java", 0);
        let outcome = filter()
            .find_usages(&request, &CancellationToken::new())
            .await;
        assert_eq!(outcome, UsageOutcome::TypeNotFound);
    }
}
