//! Records produced by a document scan and by resolution.

use serde::Serialize;

use crate::types::{Location, SourceRange};

/// A field known to the document, keyed by name in the field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub range: SourceRange,
    pub declaration_line: u32,
    pub qualifier: Option<String>,
}

/// How a bean came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BeanOrigin {
    StereotypeAnnotation,
    FactoryMethod,
    ExternalConfiguration,
}

impl BeanOrigin {
    pub fn description(&self) -> &'static str {
        match self {
            BeanOrigin::StereotypeAnnotation => "Defined via Stereotype Annotation",
            BeanOrigin::FactoryMethod => "Defined via @Bean Configuration",
            BeanOrigin::ExternalConfiguration => "Defined in External Configuration",
        }
    }
}

/// Where a dependency is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanDefinition {
    pub name: String,
    pub produced_type: String,
    pub range: SourceRange,
    pub origin: BeanOrigin,
    pub qualifier: Option<String>,
    pub is_primary: bool,
    pub description: String,
}

impl BeanDefinition {
    pub fn new(
        name: impl Into<String>,
        produced_type: impl Into<String>,
        range: SourceRange,
        origin: BeanOrigin,
    ) -> Self {
        Self {
            name: name.into(),
            produced_type: produced_type.into(),
            range,
            origin,
            qualifier: None,
            is_primary: false,
            description: origin.description().to_string(),
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
}

/// How an injection site receives its dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InjectionMethod {
    FieldAnnotation,
    ConstructorArgument,
    ConstructorMappedToField,
    ConventionConstructor,
}

impl InjectionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            InjectionMethod::FieldAnnotation => "Field Injection (@Autowired)",
            InjectionMethod::ConstructorArgument => "Constructor Injection (Argument)",
            InjectionMethod::ConstructorMappedToField => "Constructor Injection (Mapped to Field)",
            InjectionMethod::ConventionConstructor => "Lombok Constructor Injection",
        }
    }
}

/// Where a dependency is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionSite {
    pub consumed_type: String,
    pub variable_name: String,
    pub range: SourceRange,
    pub method: InjectionMethod,
    pub target_line: Option<u32>,
    pub qualifier: Option<String>,
}

impl InjectionSite {
    /// Line a "go to bean" request should be issued from.
    pub fn anchor_line(&self) -> u32 {
        self.target_line.unwrap_or(self.range.start.line)
    }
}

/// A class or interface declared in the scanned document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredClass {
    pub name: String,
    pub range: SourceRange,
    /// Whether a stereotype annotation produced a bean for this class.
    pub annotated: bool,
}

impl DeclaredClass {
    pub fn line(&self) -> u32 {
        self.range.start.line
    }
}

/// Everything one scan of a document yields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanOutput {
    pub beans: Vec<BeanDefinition>,
    pub injections: Vec<InjectionSite>,
    pub classes: Vec<DeclaredClass>,
}

impl ScanOutput {
    /// Classes that produced no local bean and may be defined elsewhere.
    pub fn unannotated_classes(&self) -> impl Iterator<Item = &DeclaredClass> {
        self.classes.iter().filter(|class| !class.annotated)
    }

    pub fn beans_of_type<'a>(
        &'a self,
        produced_type: &'a str,
    ) -> impl Iterator<Item = &'a BeanDefinition> {
        self.beans
            .iter()
            .filter(move |bean| bean.produced_type == produced_type)
    }
}

/// Outcome of a definition lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolutionResult {
    Resolved(Location),
    /// Equally ranked candidates, in discovery order.
    Ambiguous(Vec<Location>),
    Unresolved,
}

impl ResolutionResult {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ResolutionResult::Unresolved)
    }

    /// Single location to navigate to: the resolved one, or the first candidate.
    pub fn preferred(&self) -> Option<&Location> {
        match self {
            ResolutionResult::Resolved(location) => Some(location),
            ResolutionResult::Ambiguous(candidates) => candidates.first(),
            ResolutionResult::Unresolved => None,
        }
    }

    pub fn from_candidates(mut candidates: Vec<Location>) -> Self {
        match candidates.len() {
            0 => ResolutionResult::Unresolved,
            1 => ResolutionResult::Resolved(candidates.remove(0)),
            _ => ResolutionResult::Ambiguous(candidates),
        }
    }
}

impl From<Option<Location>> for ResolutionResult {
    fn from(location: Option<Location>) -> Self {
        location.map_or(ResolutionResult::Unresolved, ResolutionResult::Resolved)
    }
}
