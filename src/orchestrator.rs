// ABOUTME: Top-level coordinator that builds, runs and resumes migration plans
// ABOUTME: Wires hooks into progress tracking and reduces each run to a single DetailedResult

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bus::ProgressMessageBus;
use crate::catalog::ActionCatalog;
use crate::config::EndpointConfig;
use crate::engine::{EngineManifest, EngineStatus, MigrationEngine, PlanBuilder};
use crate::hooks::{ActionProgressHook, BatchCompletionHook, HookRegistry};
use crate::parser::format_error_block;
use crate::progress::ProgressTracker;
use crate::timer::{Clock, MigrationTimer, SystemClock};

pub const COMPLETED_MESSAGE: &str = "Migration completed.";
pub const CANCELED_MESSAGE: &str = "Migration canceled.";
pub const FAILED_MESSAGE: &str = "Migration failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Canceled,
    Failure,
}

impl From<EngineStatus> for ResultStatus {
    fn from(status: EngineStatus) -> Self {
        match status {
            EngineStatus::Completed => ResultStatus::Success,
            EngineStatus::Canceled => ResultStatus::Canceled,
            EngineStatus::Failed | EngineStatus::Pending => ResultStatus::Failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedResult {
    pub status: ResultStatus,
    /// Raw error texts left in the manifest, in the order they were raised.
    pub errors: Vec<String>,
}

impl DetailedResult {
    fn failed_to_start() -> Self {
        Self {
            status: ResultStatus::Failure,
            errors: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Which optional collaborators the orchestrator wires into its hooks.
pub struct OrchestratorOptions {
    pub track_progress: bool,
    pub publish_messages: bool,
    pub clock: Arc<dyn Clock>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            track_progress: true,
            publish_messages: true,
            clock: Arc::new(SystemClock),
        }
    }
}

/// Drives one migration at a time.
///
/// Operations that start or replace a run take `&mut self`, so at most one
/// plan/manifest pair is live per orchestrator. Hooks fire on whatever task
/// the engine uses; tracker and bus subscribers run there too.
pub struct MigrationOrchestrator<E: MigrationEngine> {
    engine: E,
    catalog: Arc<ActionCatalog>,
    tracker: Option<Arc<ProgressTracker>>,
    bus: Option<Arc<ProgressMessageBus>>,
    timer: Arc<MigrationTimer>,
    plan: Option<E::Plan>,
    manifest: Option<E::Manifest>,
}

impl<E: MigrationEngine> MigrationOrchestrator<E> {
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, OrchestratorOptions::default())
    }

    pub fn with_options(engine: E, options: OrchestratorOptions) -> Self {
        let catalog = Arc::new(ActionCatalog::from_content_types(&engine.content_types()));
        let timer = Arc::new(MigrationTimer::with_clock(
            Arc::clone(&catalog),
            options.clock,
        ));

        let tracker = options.track_progress.then(|| {
            let tracker = Arc::new(ProgressTracker::new(Arc::clone(&catalog)));
            let timer = Arc::clone(&timer);
            tracker.subscribe(move |snapshot| {
                if !snapshot.name.is_empty() {
                    timer.update_on_action_completed(&snapshot.name);
                }
            });
            tracker
        });
        let bus = options
            .publish_messages
            .then(|| Arc::new(ProgressMessageBus::new()));

        Self {
            engine,
            catalog,
            tracker,
            bus,
            timer,
            plan: None,
            manifest: None,
        }
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn tracker(&self) -> Option<&Arc<ProgressTracker>> {
        self.tracker.as_ref()
    }

    pub fn bus(&self) -> Option<&Arc<ProgressMessageBus>> {
        self.bus.as_ref()
    }

    pub fn timer(&self) -> &MigrationTimer {
        &self.timer
    }

    pub fn manifest(&self) -> Option<&E::Manifest> {
        self.manifest.as_ref()
    }

    pub fn is_plan_built(&self) -> bool {
        self.plan.is_some()
    }

    pub fn total_elapsed(&self) -> String {
        self.timer.total_elapsed()
    }

    pub fn action_elapsed(&self, action_name: &str) -> String {
        self.timer.action_elapsed(action_name)
    }

    /// Builds and validates a plan. A plan that fails validation is dropped
    /// and any previously built plan stays in place.
    pub fn build_plan(&mut self, source: &EndpointConfig, destination: &EndpointConfig) -> bool {
        let mut builder = self.engine.plan_builder();
        builder.from_source(source);
        builder.to_destination(destination);
        self.register_hooks(builder.hooks_mut());

        let report = builder.validate();
        if !report.is_success() {
            for err in &report.errors {
                error!("Plan validation failed: {}", err);
            }
            return false;
        }

        self.plan = Some(builder.build());
        info!(
            "Migration plan built: {} ({}) -> {} ({})",
            source.base_url, source.site, destination.base_url, destination.site
        );
        true
    }

    fn register_hooks(&self, hooks: &mut HookRegistry) {
        hooks.add_action_hook(Arc::new(ActionProgressHook::new(self.tracker.clone())));

        for content_type in self.engine.content_types() {
            let hook = BatchCompletionHook::new(content_type.clone(), self.bus.clone());
            hooks.add_batch_hook(&content_type, Arc::new(hook));
        }
    }

    pub async fn execute(&mut self, cancel: CancellationToken) -> DetailedResult {
        let Some(plan) = &self.plan else {
            error!("Cannot execute: no migration plan has been built");
            return DetailedResult::failed_to_start();
        };

        info!("Starting migration");
        self.begin_run();
        let outcome = self.engine.execute(plan, None, cancel).await;
        self.finish_run(outcome.status, outcome.manifest)
    }

    /// Loads the manifest at `manifest_path` and continues the run it records.
    pub async fn resume(&mut self, manifest_path: &Path, cancel: CancellationToken) -> DetailedResult {
        if self.plan.is_none() {
            error!("Cannot resume: no migration plan has been built");
            return DetailedResult::failed_to_start();
        }
        if !self.load_manifest(manifest_path, cancel.clone()).await {
            error!(
                "Cannot resume: manifest {} could not be loaded",
                manifest_path.display()
            );
            return DetailedResult::failed_to_start();
        }

        let manifest = self.manifest.take();
        let Some(plan) = &self.plan else {
            return DetailedResult::failed_to_start();
        };

        info!("Resuming migration from {}", manifest_path.display());
        self.begin_run();
        let outcome = self.engine.execute(plan, manifest, cancel).await;
        self.finish_run(outcome.status, outcome.manifest)
    }

    fn begin_run(&self) {
        self.timer.reset();
        if let Some(tracker) = &self.tracker {
            tracker.reset();
        }
        self.timer.update_on_start();
        // Setup is running until the engine reports its first action.
        if let Some(tracker) = &self.tracker {
            tracker.advance();
        }
    }

    fn finish_run(&mut self, engine_status: EngineStatus, manifest: E::Manifest) -> DetailedResult {
        self.timer.update_on_finish();

        let status = ResultStatus::from(engine_status);
        let errors = manifest.errors();
        self.manifest = Some(manifest);

        let summary = summarize(status, &errors);
        match status {
            ResultStatus::Success => info!("{}", summary),
            ResultStatus::Canceled => warn!("{}", summary),
            ResultStatus::Failure => error!("{}", summary),
        }
        if let Some(bus) = &self.bus {
            bus.publish(summary);
        }

        debug!("Run finished in {}", self.timer.total_elapsed());
        DetailedResult { status, errors }
    }

    /// Writes the current manifest to `path`. Returns false when there is no
    /// manifest, the path is empty or the write fails.
    pub async fn save_manifest(&self, path: &Path) -> bool {
        let Some(manifest) = &self.manifest else {
            debug!("No manifest to save");
            return false;
        };
        if path.as_os_str().is_empty() {
            warn!("Cannot save manifest: path is empty");
            return false;
        }

        match self.engine.save_manifest(manifest, path).await {
            Ok(()) => {
                info!("Manifest saved to {}", path.display());
                true
            }
            Err(e) => {
                error!("Failed to save manifest to {}: {:#}", path.display(), e);
                false
            }
        }
    }

    pub async fn load_manifest(&mut self, path: &Path, cancel: CancellationToken) -> bool {
        if path.as_os_str().is_empty() {
            warn!("Cannot load manifest: path is empty");
            return false;
        }

        match self.engine.load_manifest(path, cancel.clone()).await {
            Ok(manifest) => {
                info!("Manifest loaded from {}", path.display());
                self.manifest = Some(manifest);
                true
            }
            Err(_) if cancel.is_cancelled() => {
                warn!("Loading manifest from {} was canceled", path.display());
                false
            }
            Err(e) => {
                error!("Failed to load manifest from {}: {:#}", path.display(), e);
                false
            }
        }
    }
}

/// The single message published at the end of every run.
pub fn summarize(status: ResultStatus, errors: &[String]) -> String {
    let header = match status {
        ResultStatus::Success => COMPLETED_MESSAGE,
        ResultStatus::Canceled => CANCELED_MESSAGE,
        ResultStatus::Failure => FAILED_MESSAGE,
    };

    if errors.is_empty() {
        return header.to_string();
    }

    let mut lines = vec![format!("{} {} error(s):", header, errors.len())];
    lines.extend(errors.iter().map(|raw| format_error_block(raw)));
    lines.join("\n")
}
