//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod init;
pub mod navigate;
pub mod scan;
pub mod usages;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::analysis::{Analyzer, DocumentAnalysis};
use crate::config::Settings;
use crate::search::WorkspaceSearch;
use crate::types::{DocumentVersion, Location};

/// Analyzer bound to the workspace on disk.
pub struct Workspace {
    pub root: PathBuf,
    pub analyzer: Analyzer,
}

impl Workspace {
    pub fn open(settings: Settings) -> anyhow::Result<Self> {
        let root = settings.effective_root();
        let root = root
            .canonicalize()
            .with_context(|| format!("workspace root {} is not accessible", root.display()))?;
        let search = WorkspaceSearch::new(&root, &settings.search);
        crate::debug_event!("cli", "workspace", "{}", root.display());
        Ok(Self {
            analyzer: Analyzer::new(Arc::new(search), settings),
            root,
        })
    }

    /// Canonical path of a file given on the command line.
    pub fn document(&self, file: &Path) -> anyhow::Result<PathBuf> {
        file.canonicalize()
            .with_context(|| format!("cannot open {}", file.display()))
    }

    /// Scan a document so its local definitions are known.
    ///
    /// With `wait`, external resolutions for its classes finish first.
    pub async fn load(&self, file: &Path, wait: bool) -> anyhow::Result<(PathBuf, DocumentAnalysis)> {
        let path = self.document(file)?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let analysis = if wait {
            self.analyzer
                .analyze_to_completion(&path, DocumentVersion::INITIAL, &text)
                .await
        } else {
            self.analyzer.analyze(&path, DocumentVersion::INITIAL, &text)
        };
        let analysis = analysis.context("analysis was superseded")?;
        Ok((path, analysis))
    }

    /// `relative/path:line:column` for display.
    pub fn display(&self, location: &Location) -> String {
        let relative = location.path.strip_prefix(&self.root).unwrap_or(&location.path);
        Location::new(relative, location.range).to_string()
    }
}

/// Convert a 1-based line from the command line.
pub fn zero_based(line: u32) -> anyhow::Result<u32> {
    line.checked_sub(1).context("line numbers start at 1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_based() {
        assert_eq!(zero_based(1).unwrap(), 0);
        assert!(zero_based(0).is_err());
    }
}
