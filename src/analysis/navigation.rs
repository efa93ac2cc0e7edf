//! "Go to bean" and "go to class" flows on top of the analyzer.

use std::path::Path;

use serde::Serialize;

use super::model::{BeanOrigin, ResolutionResult};
use super::qualifier::select_definitions;
use super::session::Analyzer;
use crate::search::{DocumentAccess, SymbolSearch};
use crate::types::{Location, SourcePosition};

/// Where "go to bean" ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BeanTarget {
    /// A factory method or stereotype bean, possibly several candidates.
    Definition(ResolutionResult),
    /// No explicit definition, but the implementing class carries a stereotype.
    AnnotatedImplementation(Location),
    NotFound,
}

impl BeanTarget {
    pub fn location(&self) -> Option<&Location> {
        match self {
            BeanTarget::Definition(result) => result.preferred(),
            BeanTarget::AnnotatedImplementation(location) => Some(location),
            BeanTarget::NotFound => None,
        }
    }

    pub fn message(&self, type_name: &str) -> String {
        match self {
            BeanTarget::Definition(ResolutionResult::Ambiguous(candidates)) => {
                format!("{} candidate definitions for {type_name}", candidates.len())
            }
            BeanTarget::Definition(_) => format!("Bean definition for {type_name}"),
            BeanTarget::AnnotatedImplementation(_) => {
                format!("Bean defined via Annotation in {type_name}")
            }
            BeanTarget::NotFound => format!("Could not find @Bean or Stereotype for {type_name}"),
        }
    }
}

impl Analyzer {
    /// Find the bean an injection of `type_name` on `line` receives.
    ///
    /// Definitions in the document itself come first, then the external
    /// resolver, then the type's first implementation if it is annotated.
    pub async fn go_to_bean(
        &self,
        type_name: &str,
        path: &Path,
        line: u32,
        qualifier: Option<&str>,
    ) -> BeanTarget {
        if let Some(analysis) = self.latest_analysis(path) {
            let locations: Vec<Location> =
                select_definitions(analysis.beans(), type_name, qualifier)
                    .into_iter()
                    .filter(|bean| bean.origin != BeanOrigin::ExternalConfiguration)
                    .map(|bean| Location::new(path, bean.range))
                    .collect();
            if !locations.is_empty() {
                return BeanTarget::Definition(ResolutionResult::from_candidates(locations));
            }
        }

        let result = self.resolve(type_name, path, line, qualifier).await;
        if result.is_resolved() {
            return BeanTarget::Definition(result);
        }

        match self.annotated_implementation(type_name, path, line).await {
            Some(location) => BeanTarget::AnnotatedImplementation(location),
            None => BeanTarget::NotFound,
        }
    }

    /// Implementations of `type_name`: one, several, or none.
    pub async fn go_to_class(&self, type_name: &str, path: &Path, line: u32) -> ResolutionResult {
        ResolutionResult::from_candidates(self.implementations(type_name, path, line).await)
    }

    async fn annotated_implementation(
        &self,
        type_name: &str,
        path: &Path,
        line: u32,
    ) -> Option<Location> {
        let first = self
            .implementations(type_name, path, line)
            .await
            .into_iter()
            .next()?;
        match self.capabilities().open_document(&first.path).await {
            Ok(text) if self.dialect().is_stereotype(&text) => Some(first),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("[navigation] cannot read implementation: {e}");
                None
            }
        }
    }

    async fn implementations(&self, type_name: &str, path: &Path, line: u32) -> Vec<Location> {
        let position = self.position_of(type_name, path, line).await;
        match self
            .capabilities()
            .find_implementations(path, position)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("[navigation] implementation search for {type_name} failed: {e}");
                Vec::new()
            }
        }
    }

    /// Column of `name` on the line, or the line start when it is absent.
    async fn position_of(&self, name: &str, path: &Path, line: u32) -> SourcePosition {
        let column = match self.capabilities().line_at(path, line).await {
            Ok(text) => text.find(name).unwrap_or(0),
            Err(_) => 0,
        };
        SourcePosition::new(line, column as u32)
    }
}
