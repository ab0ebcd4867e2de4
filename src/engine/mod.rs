// ABOUTME: Collaborator surface of the external migration engine
// ABOUTME: Plan building, execution, manifest persistence and the declared content pipeline

pub mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::catalog::split_camel_case;
use crate::config::EndpointConfig;
use crate::hooks::HookRegistry;

pub use simulated::{SimulatedEngine, SimulatedManifest, SimulatedPlan};

/// One content category of the engine's pipeline, identified by its
/// configuration key (e.g. `ServerExtractRefreshTask`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentType {
    pub config_key: String,
}

impl ContentType {
    pub fn new(config_key: impl Into<String>) -> Self {
        Self {
            config_key: config_key.into(),
        }
    }

    pub fn display_name(&self) -> String {
        split_camel_case(&self.config_key)
    }
}

/// Terminal status the engine reports for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineStatus {
    Completed,
    Canceled,
    Failed,
    /// The run returned without reaching a terminal state.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Pending,
    Skipped,
    Migrated,
    Error,
    Canceled,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Skipped => "Skipped",
            ItemStatus::Migrated => "Migrated",
            ItemStatus::Error => "Error",
            ItemStatus::Canceled => "Canceled",
        };
        f.write_str(name)
    }
}

/// Per-item outcome inside one completed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub source_location: String,
    pub destination_location: String,
    pub status: ItemStatus,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub trait EngineManifest: Send + Sync {
    /// Raw error texts raised during the run, in the order they occurred.
    fn errors(&self) -> Vec<String>;
}

pub trait PlanBuilder: Send {
    type Plan: Send + Sync;

    fn from_source(&mut self, endpoint: &EndpointConfig);
    fn to_destination(&mut self, endpoint: &EndpointConfig);
    fn hooks_mut(&mut self) -> &mut HookRegistry;
    fn validate(&self) -> ValidationReport;
    fn build(self) -> Self::Plan;
}

pub struct ExecutionOutcome<M> {
    pub status: EngineStatus,
    pub manifest: M,
}

#[async_trait]
pub trait MigrationEngine: Send + Sync {
    type Plan: Send + Sync;
    type Manifest: EngineManifest;
    type Builder: PlanBuilder<Plan = Self::Plan>;

    /// Declared pipeline, in execution order. Does not change at runtime.
    fn content_types(&self) -> Vec<ContentType>;

    fn plan_builder(&self) -> Self::Builder;

    /// Runs `plan`, resuming from `manifest` when one is given.
    async fn execute(
        &self,
        plan: &Self::Plan,
        manifest: Option<Self::Manifest>,
        cancel: CancellationToken,
    ) -> ExecutionOutcome<Self::Manifest>;

    async fn save_manifest(&self, manifest: &Self::Manifest, path: &Path) -> anyhow::Result<()>;

    async fn load_manifest(
        &self,
        path: &Path,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self::Manifest>;
}
