//! Analysis sessions.
//!
//! [`Analyzer`] owns one [`DocumentSession`] per open document. A scan is
//! published immediately; external resolutions for classes without a local
//! stereotype run afterwards, land in the document's cache and are announced
//! through [`AnalysisEvent::ResolutionCompleted`]. Readers pick them up from
//! [`Analyzer::latest_analysis`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::cache::{AnalysisCache, CacheEntry};
use super::events::{AnalysisEvent, EventBroadcaster};
use super::external::ExternalBeanResolver;
use super::line::Dialect;
use super::model::{BeanDefinition, BeanOrigin, DeclaredClass, ResolutionResult, ScanOutput};
use super::qualifier::BeanLinks;
use super::usages::{UsageFilter, UsageOutcome, UsageRequest};
use crate::config::Settings;
use crate::scheduler::ScanScheduler;
use crate::search::Capabilities;
use crate::types::{DocumentVersion, Location};

/// Bounds of the period at which settled edits are polled.
const MIN_TICK: Duration = Duration::from_millis(1);
const MAX_TICK: Duration = Duration::from_millis(100);

/// What the presentation layer renders for one document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentAnalysis {
    pub path: PathBuf,
    pub version: DocumentVersion,
    pub output: ScanOutput,
    /// Where classes of this document are defined as beans elsewhere.
    pub external: BTreeMap<String, Location>,
}

impl DocumentAnalysis {
    pub fn beans(&self) -> &[BeanDefinition] {
        &self.output.beans
    }

    pub fn links(&self) -> BeanLinks {
        BeanLinks::build(&self.output)
    }

    /// Add an external-configuration bean for each resolved class.
    fn merge_external(&mut self, resolved: Vec<(String, ResolutionResult)>) {
        for (class_name, result) in resolved {
            let Some(location) = result.preferred().cloned() else {
                continue;
            };
            let Some(class) = self
                .output
                .classes
                .iter()
                .find(|c| c.name == class_name && !c.annotated) else {
                continue;
            };
            self.output.beans.push(BeanDefinition::new(
                class.name.clone(),
                class.name.clone(),
                class.range,
                BeanOrigin::ExternalConfiguration,
            ));
            self.external.insert(class_name, location);
        }
    }
}

/// State kept for one open document.
pub struct DocumentSession {
    path: PathBuf,
    cache: Arc<AnalysisCache>,
    published: RwLock<Option<DocumentAnalysis>>,
}

impl DocumentSession {
    fn new(path: PathBuf, events: EventBroadcaster) -> Self {
        Self {
            cache: Arc::new(AnalysisCache::new(path.clone(), events)),
            path,
            published: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Store `analysis` unless a newer version was already published.
    fn publish(&self, analysis: DocumentAnalysis) -> bool {
        let mut published = self.published.write();
        if published
            .as_ref()
            .is_some_and(|current| current.version > analysis.version)
        {
            return false;
        }
        *published = Some(analysis);
        true
    }
}

/// Entry point for scanning, resolving and searching usages.
pub struct Analyzer {
    capabilities: Arc<dyn Capabilities>,
    dialect: Arc<Dialect>,
    settings: Arc<Settings>,
    resolver: ExternalBeanResolver,
    usages: UsageFilter,
    documents: DashMap<PathBuf, Arc<DocumentSession>>,
    scheduler: Mutex<ScanScheduler>,
    events: EventBroadcaster,
}

impl Analyzer {
    pub fn new(capabilities: Arc<dyn Capabilities>, settings: Settings) -> Self {
        let dialect = Arc::new(Dialect::from_config(&settings.analysis));
        let resolver = ExternalBeanResolver::new(
            capabilities.clone(),
            dialect.clone(),
            settings.analysis.clone(),
            settings.search.clone(),
        );
        let usages = UsageFilter::new(
            capabilities.clone(),
            dialect.clone(),
            settings.analysis.clone(),
        );
        let scheduler = Mutex::new(ScanScheduler::new(settings.scheduler.debounce_ms));

        Self {
            capabilities,
            dialect,
            settings: Arc::new(settings),
            resolver,
            usages,
            documents: DashMap::new(),
            scheduler,
            events: EventBroadcaster::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub(crate) fn capabilities(&self) -> &dyn Capabilities {
        self.capabilities.as_ref()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AnalysisEvent> {
        self.events.subscribe()
    }

    /// Scan text without touching any session state.
    pub fn scan_text(&self, text: &str) -> ScanOutput {
        super::scan_document(text, &self.dialect)
    }

    pub fn session(&self, path: &Path) -> Arc<DocumentSession> {
        self.documents
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                Arc::new(DocumentSession::new(
                    path.to_path_buf(),
                    self.events.clone(),
                ))
            })
            .clone()
    }

    /// Scan and publish `version` of a document, then start external
    /// resolutions in the background.
    ///
    /// Returns `None` when a newer edit of the document is already known.
    pub fn analyze(
        &self,
        path: &Path,
        version: DocumentVersion,
        text: &str,
    ) -> Option<DocumentAnalysis> {
        let mut tasks = self.start_analysis(path, version, text)?;
        tasks.detach_all();
        self.latest_analysis(path)
    }

    /// Like [`Analyzer::analyze`], but waits for every external resolution.
    pub async fn analyze_to_completion(
        &self,
        path: &Path,
        version: DocumentVersion,
        text: &str,
    ) -> Option<DocumentAnalysis> {
        let mut tasks = self.start_analysis(path, version, text)?;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("[session] resolution task failed: {e}");
            }
        }
        self.latest_analysis(path)
    }

    fn start_analysis(
        &self,
        path: &Path,
        version: DocumentVersion,
        text: &str,
    ) -> Option<JoinSet<()>> {
        if !self.accepts(path, version) {
            crate::debug_event!(
                "session",
                "superseded",
                "{} v{}",
                path.display(),
                version.value()
            );
            return None;
        }

        let session = self.session(path);
        session.cache.observe(version);

        let output = self.scan_text(text);
        let pending: Vec<DeclaredClass> = output
            .unannotated_classes()
            .filter(|class| session.cache.get(&class.name).is_none())
            .cloned()
            .collect();

        let published = session.publish(DocumentAnalysis {
            path: path.to_path_buf(),
            version,
            output,
            external: BTreeMap::new(),
        });
        if published {
            crate::log_event!(
                "session",
                "published",
                "{} v{}",
                path.display(),
                version.value()
            );
            self.events.send(AnalysisEvent::AnalysisPublished {
                path: path.to_path_buf(),
                version,
            });
        }

        let mut tasks = JoinSet::new();
        for class in pending {
            if !session.cache.begin(version, &class.name) {
                continue;
            }
            let resolver = self.resolver.clone();
            let cache = session.cache.clone();
            let path = path.to_path_buf();
            tasks.spawn(async move {
                let location = resolver
                    .resolve(&path, class.line(), &class.name, None)
                    .await;
                cache.complete(version, &class.name, ResolutionResult::from(location));
            });
        }
        Some(tasks)
    }

    /// Newest published analysis with finished external resolutions merged in.
    pub fn latest_analysis(&self, path: &Path) -> Option<DocumentAnalysis> {
        let session = self.documents.get(path)?.clone();
        let mut analysis = session.published.read().clone()?;
        if session.cache.version() == analysis.version {
            analysis.merge_external(session.cache.resolved());
        }
        Some(analysis)
    }

    /// Resolve the definition of `type_name`, declared on `line` of `path`.
    ///
    /// Unqualified results are shared with the document's cache.
    pub async fn resolve(
        &self,
        type_name: &str,
        path: &Path,
        line: u32,
        qualifier: Option<&str>,
    ) -> ResolutionResult {
        if qualifier.is_some() {
            return self
                .resolver
                .resolve(path, line, type_name, qualifier)
                .await
                .into();
        }

        let session = self.session(path);
        if let Some(CacheEntry::Resolved(result)) = session.cache.get(type_name) {
            crate::debug_event!("session", "cache hit", "{type_name}");
            return result;
        }

        let version = session.cache.version();
        let claimed = session.cache.begin(version, type_name);
        let result: ResolutionResult = self
            .resolver
            .resolve(path, line, type_name, None)
            .await
            .into();
        if claimed {
            session.cache.complete(version, type_name, result.clone());
        }
        result
    }

    pub async fn find_usages(
        &self,
        request: &UsageRequest,
        cancel: &CancellationToken,
    ) -> UsageOutcome {
        self.usages.find_usages(request, cancel).await
    }

    /// Record an edit. The document's cache is invalidated right away; the
    /// re-scan happens once the edit has settled.
    pub fn submit_edit(&self, path: &Path, text: String) -> DocumentVersion {
        let version = self.scheduler.lock().submit(path.to_path_buf(), text);
        self.session(path).cache.observe(version);
        version
    }

    /// Analyze every settled edit whose version is still the newest.
    pub fn run_ready(&self) -> Vec<DocumentAnalysis> {
        let ready = self.scheduler.lock().take_ready();
        ready
            .into_iter()
            .filter_map(|request| self.analyze(&request.path, request.version, &request.text))
            .collect()
    }

    /// Forget everything about a closed document.
    pub fn close(&self, path: &Path) {
        self.scheduler.lock().remove(path);
        self.documents.remove(path);
    }

    /// Consume edits until cancelled, re-scanning documents once they settle.
    pub async fn run(
        self: Arc<Self>,
        mut edits: mpsc::Receiver<(PathBuf, String)>,
        cancel: CancellationToken,
    ) {
        let debounce = self.scheduler.lock().debounce();
        let mut tick = interval(debounce.clamp(MIN_TICK, MAX_TICK));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                edit = edits.recv() => {
                    match edit {
                        Some((path, text)) => {
                            self.submit_edit(&path, text);
                        }
                        None => {
                            crate::debug_event!("session", "edit channel closed");
                            break;
                        }
                    }
                }

                _ = tick.tick() => {
                    self.run_ready();
                }

                _ = cancel.cancelled() => {
                    crate::debug_event!("session", "cancelled");
                    break;
                }
            }
        }
        self.run_ready();
    }

    fn accepts(&self, path: &Path, version: DocumentVersion) -> bool {
        self.scheduler
            .lock()
            .latest_version(path)
            .is_none_or(|latest| latest == version)
    }
}
