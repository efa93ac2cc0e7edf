pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod search;
pub mod types;

pub use analysis::{
    Analyzer, BeanDefinition, BeanOrigin, BeanTarget, Dialect, DocumentAnalysis, InjectionMethod,
    InjectionSite, ResolutionResult, ScanOutput, UsageOutcome, UsageRequest, scan_document,
};
pub use config::Settings;
pub use error::{SearchError, SearchResult};
pub use search::{Capabilities, DocumentAccess, FileSearch, SymbolSearch, WorkspaceSearch};
pub use types::{DocumentVersion, Location, SourcePosition, SourceRange};
