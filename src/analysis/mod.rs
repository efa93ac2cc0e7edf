//! Bean and injection analysis for annotation-driven Java sources.
//!
//! A scan is a pure function of the document text. Anything that needs other
//! files (external definitions, usages) goes through the capability traits in
//! [`crate::search`] and never fails outward.

pub mod cache;
pub mod events;
pub mod external;
pub mod fields;
pub mod line;
pub mod model;
mod navigation;
pub mod qualifier;
pub mod scanner;
pub mod session;
pub mod usages;

pub use cache::{AnalysisCache, CacheEntry};
pub use events::{AnalysisEvent, EventBroadcaster};
pub use external::ExternalBeanResolver;
pub use fields::FieldTable;
pub use line::Dialect;
pub use model::{
    BeanDefinition, BeanOrigin, DeclaredClass, FieldEntry, InjectionMethod, InjectionSite,
    ResolutionResult, ScanOutput,
};
pub use navigation::BeanTarget;
pub use qualifier::{BeanLinks, qualifier_matches};
pub use session::{Analyzer, DocumentAnalysis};
pub use usages::{UsageFilter, UsageOutcome, UsageRequest};

use scanner::ScanContext;

/// Scan a whole document: field table first, then the declaration pass.
pub fn scan_document(text: &str, dialect: &Dialect) -> ScanOutput {
    let lines: Vec<&str> = text.lines().collect();
    let fields = FieldTable::build(&lines);
    let ctx = ScanContext {
        lines: &lines,
        fields: &fields,
        dialect,
        convention_constructor: dialect.is_convention_constructor(text),
    };
    scanner::scan(&ctx)
}
