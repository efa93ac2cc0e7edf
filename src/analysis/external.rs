//! External bean resolver.
//!
//! Finds where a class without a local stereotype is produced: first by
//! walking references from the symbol index and looking for a factory marker
//! just above them, then by scanning convention-named configuration files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::line::{Dialect, method_declaration};
use super::qualifier::CandidatePicker;
use crate::config::{AnalysisConfig, SearchConfig};
use crate::search::{Capabilities, DocumentAccess, FileSearch, SymbolSearch};
use crate::types::{Location, SourcePosition, SourceRange};

/// Resolves bean definitions that live outside the scanned document.
#[derive(Clone)]
pub struct ExternalBeanResolver {
    capabilities: Arc<dyn Capabilities>,
    dialect: Arc<Dialect>,
    analysis: AnalysisConfig,
    search: SearchConfig,
}

impl ExternalBeanResolver {
    pub fn new(
        capabilities: Arc<dyn Capabilities>,
        dialect: Arc<Dialect>,
        analysis: AnalysisConfig,
        search: SearchConfig,
    ) -> Self {
        Self {
            capabilities,
            dialect,
            analysis,
            search,
        }
    }

    /// Definition site of `class_name`, declared on `line` of `document`.
    ///
    /// Lookup failures are logged and treated as "nothing found".
    pub async fn resolve(
        &self,
        document: &Path,
        line: u32,
        class_name: &str,
        required: Option<&str>,
    ) -> Option<Location> {
        let by_reference = self
            .search_references(document, line, class_name, required)
            .await;
        if by_reference.is_decided() {
            crate::debug_event!("external", "resolved by reference", "{class_name}");
            return by_reference.into_best();
        }

        let by_convention = self.scan_config_files(class_name, required).await;
        if by_convention.is_decided() {
            crate::debug_event!("external", "resolved by config file", "{class_name}");
            return by_convention.into_best();
        }

        let found = by_reference.into_best().or_else(|| by_convention.into_best());
        crate::debug_event!(
            "external",
            "fallback",
            "{class_name}: {}",
            if found.is_some() { "first seen" } else { "unresolved" }
        );
        found
    }

    /// Reference walk: factory marker within a few lines above a reference.
    async fn search_references(
        &self,
        document: &Path,
        line: u32,
        class_name: &str,
        required: Option<&str>,
    ) -> CandidatePicker<Location> {
        let mut picker = CandidatePicker::new(required);

        let column = match self.capabilities.line_at(document, line).await {
            Ok(text) => text.find(class_name).unwrap_or(0),
            Err(e) => {
                tracing::warn!("[external] cannot read declaration line: {e}");
                return picker;
            }
        };

        let references = match self
            .capabilities
            .find_references(document, SourcePosition::new(line, column as u32))
            .await
        {
            Ok(references) => references,
            Err(e) => {
                tracing::warn!("[external] reference search for {class_name} failed: {e}");
                return picker;
            }
        };

        let references = rank_by_config_naming(references, &self.analysis.config_name_tokens);
        let quoted = required.map(|q| format!("\"{q}\""));
        let mut documents: HashMap<PathBuf, Option<String>> = HashMap::new();

        for reference in references
            .into_iter()
            .take(self.analysis.max_reference_candidates)
        {
            if reference.is_in(document) {
                continue;
            }
            let Some(text) = self.document(&mut documents, &reference.path).await else {
                continue;
            };
            let window = lookback_window(text, reference.line(), self.analysis.factory_lookback_lines);
            if !self.dialect.is_factory(&window) {
                continue;
            }

            let carries_required = quoted.as_deref().is_some_and(|q| window.contains(q));
            let is_primary = self.dialect.is_primary(&window);
            if picker.offer(reference, carries_required, is_primary).is_decisive() {
                break;
            }
        }

        picker
    }

    /// Convention scan: configuration-named files, tracked line by line.
    async fn scan_config_files(
        &self,
        class_name: &str,
        required: Option<&str>,
    ) -> CandidatePicker<Location> {
        let mut picker = CandidatePicker::new(required);

        let files = match self
            .capabilities
            .find_files(
                &self.search.config_file_glob,
                Some(self.search.exclude_glob.as_str()),
                self.search.config_file_limit,
            )
            .await
        {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("[external] config file search failed: {e}");
                return picker;
            }
        };

        let quoted = required.map(|q| format!("\"{q}\""));
        for file in files {
            let text = match self.capabilities.open_document(&file).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("[external] skipping {}: {e}", file.display());
                    continue;
                }
            };
            if !self.dialect.is_factory(&text) || !text.contains(class_name) {
                continue;
            }

            for candidate in factory_methods(&text, class_name, &self.dialect, quoted.as_deref()) {
                let location = Location::new(&file, candidate.range);
                let offer = picker.offer(location, candidate.qualified, candidate.primary);
                if offer.is_decisive() {
                    return picker;
                }
            }
        }

        picker
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
                    tracing::warn!("[external] skipping {}: {e}", path.display());
                    None
                }
            };
            documents.insert(path.to_path_buf(), text);
        }
        documents.get(path).and_then(Option::as_ref)
    }
}

/// Stable sort putting configuration-looking paths first.
pub fn rank_by_config_naming(mut references: Vec<Location>, tokens: &[String]) -> Vec<Location> {
    references.sort_by_key(|reference| {
        let path = reference.path.to_string_lossy();
        !tokens.iter().any(|token| path.contains(token.as_str()))
    });
    references
}

/// Lines `line - lookback ..= line + 1`, clamped to the document.
fn lookback_window(text: &str, line: u32, lookback: u32) -> String {
    let start = line.saturating_sub(lookback) as usize;
    let len = (line as usize + 2).saturating_sub(start);
    text.lines().skip(start).take(len).collect::<Vec<_>>().join("\n")
}

/// A factory method producing the target type in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryCandidate {
    pub range: SourceRange,
    pub primary: bool,
    /// The requested qualifier literal appeared since the factory marker.
    pub qualified: bool,
}

/// Factory methods returning `class_name`, in file order.
///
/// Markers accumulate from a factory annotation up to the next method
/// declaration, which either produces the type or resets them.
pub fn factory_methods(
    text: &str,
    class_name: &str,
    dialect: &Dialect,
    quoted_qualifier: Option<&str>,
) -> Vec<FactoryCandidate> {
    let mut found = Vec::new();
    let mut bean = false;
    let mut primary = false;
    let mut qualified = false;

    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        let method = method_declaration(raw);
        if dialect.starts_with_factory(trimmed) {
            bean = true;
        }
        if dialect.starts_with_primary(trimmed) {
            primary = true;
        }
        let head = method.map_or(raw, |m| &raw[..m.name.end()]);
        if quoted_qualifier.is_some_and(|q| head.contains(q)) {
            qualified = true;
        }

        let Some(method) = method else {
            continue;
        };
        if bean && method.return_type.text == class_name {
            found.push(FactoryCandidate {
                range: SourceRange::on_line(
                    idx as u32,
                    method.return_type.column,
                    class_name.len(),
                ),
                primary,
                qualified,
            });
        }
        bean = false;
        primary = false;
        qualified = false;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"@Configuration
public class AppConfig {
    @Bean
    public Foo plainFoo() {
        return new Foo();
    }

    @Bean
    @Primary
    public Foo primaryFoo() {
        return new Foo();
    }

    @Bean
    @Qualifier("eu")
    public Foo euFoo() {
        return new Foo();
    }

    @Bean
    public Bar bar() {
        return new Bar();
    }
}
"#;

    #[test]
    fn test_factory_methods_track_markers() {
        let dialect = Dialect::default();
        let found = factory_methods(CONFIG, "Foo", &dialect, None);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].range.line(), 3);
        assert!(!found[0].primary);
        assert_eq!(found[1].range.line(), 9);
        assert!(found[1].primary);
        assert_eq!(found[1].range, SourceRange::on_line(9, 11, 3));
        assert_eq!(found[2].range.line(), 15);
        assert!(!found[2].qualified);
    }

    #[test]
    fn test_factory_methods_ignore_parameter_qualifier() {
        let config = "@Bean\npublic Foo foo(@Qualifier(\"eu\") Bar bar) {\n}";
        let found = factory_methods(config, "Foo", &Dialect::default(), Some("\"eu\""));
        assert_eq!(found.len(), 1);
        assert!(!found[0].qualified);
    }

    #[test]
    fn test_factory_methods_qualifier_flag() {
        let dialect = Dialect::default();
        let found = factory_methods(CONFIG, "Foo", &dialect, Some("\"eu\""));
        let qualified: Vec<u32> = found
            .iter()
            .filter(|c| c.qualified)
            .map(|c| c.range.line())
            .collect();
        assert_eq!(qualified, vec![15]);
    }

    #[test]
    fn test_markers_do_not_leak_past_other_methods() {
        let src = "    @Primary\n    public Bar bar() {}\n    @Bean\n    public Foo foo() {}";
        let found = factory_methods(src, "Foo", &Dialect::default(), None);
        assert_eq!(found.len(), 1);
        assert!(!found[0].primary);
    }

    #[test]
    fn test_rank_by_config_naming_is_stable() {
        let loc = |path: &str| Location::new(path, SourceRange::on_line(0, 0, 1));
        let ranked = rank_by_config_naming(
            vec![
                loc("src/OrderService.java"),
                loc("src/AppConfig.java"),
                loc("src/Billing.java"),
                loc("src/Application.java"),
            ],
            &["Config".to_string(), "App".to_string()],
        );
        let paths: Vec<String> = ranked
            .iter()
            .map(|l| l.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            paths,
            vec![
                "src/AppConfig.java",
                "src/Application.java",
                "src/OrderService.java",
                "src/Billing.java"
            ]
        );
    }

    #[test]
    fn test_lookback_window_clamps() {
        let text = "a\nb\nc\nd\ne\nf\ng\nh";
        assert_eq!(lookback_window(text, 1, 5), "a\nb\nc");
        assert_eq!(lookback_window(text, 6, 5), "b\nc\nd\ne\nf\ng\nh");
        assert_eq!(lookback_window(text, 7, 2), "f\ng\nh");
    }
}
