// ABOUTME: End-to-end orchestrator scenarios against a scripted engine
// ABOUTME: Covers success, failure, cancellation and resume paths and the published summary

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use content_migrator::hooks::ActionProgressHook;
use content_migrator::orchestrator::{CANCELED_MESSAGE, COMPLETED_MESSAGE, FAILED_MESSAGE};
use content_migrator::progress::FINISHED_MESSAGE;
use content_migrator::{
    BatchItem, ContentType, DetailedResult, EndpointConfig, EngineManifest, EngineStatus,
    ExecutionOutcome, HookRegistry, ItemStatus, MessageLog, MigrationEngine,
    MigrationOrchestrator, PlanBuilder, ResultStatus, ValidationReport,
};

#[derive(Debug, Clone, Default)]
struct ScriptedManifest {
    errors: Vec<String>,
}

impl EngineManifest for ScriptedManifest {
    fn errors(&self) -> Vec<String> {
        self.errors.clone()
    }
}

struct ScriptedBuilder {
    endpoints: Vec<EndpointConfig>,
    hooks: HookRegistry,
}

impl PlanBuilder for ScriptedBuilder {
    type Plan = HookRegistry;

    fn from_source(&mut self, endpoint: &EndpointConfig) {
        self.endpoints.push(endpoint.clone());
    }

    fn to_destination(&mut self, endpoint: &EndpointConfig) {
        self.endpoints.push(endpoint.clone());
    }

    fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    fn validate(&self) -> ValidationReport {
        let errors = self
            .endpoints
            .iter()
            .flat_map(|endpoint| endpoint.validate("endpoint"))
            .collect();
        ValidationReport { errors }
    }

    fn build(self) -> HookRegistry {
        self.hooks
    }
}

/// Fires every action hook, delivers the scripted batches, then reports the
/// scripted status and errors.
struct ScriptedEngine {
    content_types: Vec<ContentType>,
    batches: Vec<(ContentType, Vec<BatchItem>)>,
    status: EngineStatus,
    errors: Vec<String>,
    resumed_from: Arc<Mutex<Option<Vec<String>>>>,
}

impl ScriptedEngine {
    fn new(status: EngineStatus, errors: &[&str]) -> Self {
        Self {
            content_types: vec![ContentType::new("User"), ContentType::new("Project")],
            batches: Vec::new(),
            status,
            errors: errors.iter().map(|e| e.to_string()).collect(),
            resumed_from: Arc::new(Mutex::new(None)),
        }
    }

    fn with_batch(mut self, key: &str, items: Vec<BatchItem>) -> Self {
        self.batches.push((ContentType::new(key), items));
        self
    }
}

#[async_trait]
impl MigrationEngine for ScriptedEngine {
    type Plan = HookRegistry;
    type Manifest = ScriptedManifest;
    type Builder = ScriptedBuilder;

    fn content_types(&self) -> Vec<ContentType> {
        self.content_types.clone()
    }

    fn plan_builder(&self) -> ScriptedBuilder {
        ScriptedBuilder {
            endpoints: Vec::new(),
            hooks: HookRegistry::default(),
        }
    }

    async fn execute(
        &self,
        plan: &HookRegistry,
        manifest: Option<ScriptedManifest>,
        _cancel: CancellationToken,
    ) -> ExecutionOutcome<ScriptedManifest> {
        *self.resumed_from.lock() = manifest.map(|m| m.errors);

        plan.action_completed();
        for (content_type, items) in &self.batches {
            plan.batch_completed(content_type, items);
        }
        for _ in &self.content_types {
            plan.action_completed();
        }

        ExecutionOutcome {
            status: self.status,
            manifest: ScriptedManifest {
                errors: self.errors.clone(),
            },
        }
    }

    async fn save_manifest(&self, manifest: &ScriptedManifest, path: &Path) -> anyhow::Result<()> {
        tokio::fs::write(path, manifest.errors.join("\u{1e}")).await?;
        Ok(())
    }

    async fn load_manifest(
        &self,
        path: &Path,
        _cancel: CancellationToken,
    ) -> anyhow::Result<ScriptedManifest> {
        let raw = tokio::fs::read_to_string(path).await?;
        let errors = raw
            .split('\u{1e}')
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ScriptedManifest { errors })
    }
}

fn endpoints() -> (EndpointConfig, EndpointConfig) {
    (
        EndpointConfig::new("https://a.example.com", "", "migrator", "token-a"),
        EndpointConfig::new("https://b.example.com", "", "migrator", "token-b"),
    )
}

fn built(engine: ScriptedEngine) -> (MigrationOrchestrator<ScriptedEngine>, MessageLog) {
    let mut orchestrator = MigrationOrchestrator::new(engine);
    let (log, _) = MessageLog::attach(orchestrator.bus().unwrap());
    let (source, destination) = endpoints();
    assert!(orchestrator.build_plan(&source, &destination));
    (orchestrator, log)
}

#[tokio::test]
async fn test_successful_run_publishes_one_completion_message() {
    let (mut orchestrator, log) = built(ScriptedEngine::new(EngineStatus::Completed, &[]));

    let result = orchestrator.execute(CancellationToken::new()).await;

    assert_eq!(
        result,
        DetailedResult {
            status: ResultStatus::Success,
            errors: Vec::new(),
        }
    );
    let completed: Vec<_> = log
        .entries()
        .into_iter()
        .filter(|m| m.text.starts_with("Migration completed"))
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].text, COMPLETED_MESSAGE);
    assert_eq!(
        orchestrator.tracker().unwrap().current_message(),
        FINISHED_MESSAGE
    );
}

#[tokio::test]
async fn test_failed_run_reports_every_error() {
    let engine = ScriptedEngine::new(
        EngineStatus::Failed,
        &[
            "URL: https://b.example.com/api/projects\nCode: 409\nSummary: Conflict\nDetail: Project exists",
            "<html>502 Bad Gateway</html>",
        ],
    );
    let (mut orchestrator, log) = built(engine);

    let result = orchestrator.execute(CancellationToken::new()).await;

    assert_eq!(result.status, ResultStatus::Failure);
    assert_eq!(result.errors.len(), 2);

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    let summary = &entries[0].text;
    assert!(summary.starts_with(FAILED_MESSAGE));
    assert!(summary.contains("\tCode: 409\n\tSummary: Conflict\n\tDetail: Project exists"));
    assert!(summary.contains("\tCould not parse error message: <html>502 Bad Gateway</html>"));
}

#[tokio::test]
async fn test_canceled_run() {
    let (mut orchestrator, log) = built(ScriptedEngine::new(EngineStatus::Canceled, &[]));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = orchestrator.execute(cancel).await;

    assert_eq!(result.status, ResultStatus::Canceled);
    assert_eq!(log.entries().last().unwrap().text, CANCELED_MESSAGE);
}

#[tokio::test]
async fn test_pending_engine_status_is_failure() {
    let (mut orchestrator, _log) = built(ScriptedEngine::new(EngineStatus::Pending, &[]));

    let result = orchestrator.execute(CancellationToken::new()).await;

    assert_eq!(result.status, ResultStatus::Failure);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_batches_are_published_before_summary() {
    let engine = ScriptedEngine::new(EngineStatus::Completed, &[]).with_batch(
        "Project",
        vec![BatchItem {
            source_location: "Default/Finance".to_string(),
            destination_location: "Finance".to_string(),
            status: ItemStatus::Migrated,
            errors: Vec::new(),
        }],
    );
    let (mut orchestrator, log) = built(engine);

    orchestrator.execute(CancellationToken::new()).await;

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action.as_deref(), Some("Project"));
    assert_eq!(entries[0].text, "🟢 [Default/Finance] to [Finance] → Migrated");
    assert_eq!(entries[1].text, COMPLETED_MESSAGE);
}

#[tokio::test]
async fn test_resume_without_loadable_manifest_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let (mut orchestrator, log) = built(ScriptedEngine::new(EngineStatus::Completed, &[]));

    let result = orchestrator
        .resume(&dir.path().join("never-saved.json"), CancellationToken::new())
        .await;

    assert_eq!(
        result,
        DetailedResult {
            status: ResultStatus::Failure,
            errors: Vec::new(),
        }
    );
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_resume_hands_loaded_manifest_to_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.bin");
    let engine = ScriptedEngine::new(EngineStatus::Failed, &["Detail: quota exceeded"]);
    let resumed_from = Arc::clone(&engine.resumed_from);
    let (mut orchestrator, _log) = built(engine);

    orchestrator.execute(CancellationToken::new()).await;
    assert!(resumed_from.lock().is_none());
    assert!(orchestrator.save_manifest(&path).await);

    let result = orchestrator.resume(&path, CancellationToken::new()).await;

    assert_eq!(result.status, ResultStatus::Failure);
    assert_eq!(
        resumed_from.lock().clone(),
        Some(vec!["Detail: quota exceeded".to_string()])
    );
}

#[test]
fn test_invalid_endpoints_do_not_build() {
    let mut orchestrator =
        MigrationOrchestrator::new(ScriptedEngine::new(EngineStatus::Completed, &[]));
    let (source, _) = endpoints();
    let missing_token = EndpointConfig::new("https://b.example.com", "", "migrator", "");

    assert!(!orchestrator.build_plan(&source, &missing_token));
    assert!(!orchestrator.is_plan_built());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_hook_delivery_is_serialized() {
    let orchestrator =
        MigrationOrchestrator::new(ScriptedEngine::new(EngineStatus::Completed, &[]));
    let tracker = Arc::clone(orchestrator.tracker().unwrap());

    let mut registry = HookRegistry::default();
    registry.add_action_hook(Arc::new(ActionProgressHook::new(Some(Arc::clone(
        &tracker,
    )))));
    let registry = Arc::new(registry);

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.action_completed() })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(tracker.current_index(), 2);
    assert_eq!(tracker.current_name(), "Project");
}
