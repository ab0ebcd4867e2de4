// ABOUTME: In-process engine that walks the content pipeline without transferring anything
// ABOUTME: Drives every hook and writes a JSON manifest so runs can be rehearsed and resumed

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::{
    BatchItem, ContentType, EngineManifest, EngineStatus, ExecutionOutcome, ItemStatus,
    MigrationEngine, PlanBuilder, ValidationReport,
};
use crate::config::EndpointConfig;
use crate::error::MigratorError;
use crate::hooks::HookRegistry;

const DEFAULT_PIPELINE: &[&str] = &[
    "User",
    "Group",
    "Project",
    "DataSource",
    "Workbook",
    "ServerExtractRefreshTask",
    "CustomView",
    "Subscription",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedManifest {
    /// Config keys of content types whose batch has been processed.
    pub completed: Vec<String>,
    pub entries: Vec<BatchItem>,
    pub errors: Vec<String>,
}

impl EngineManifest for SimulatedManifest {
    fn errors(&self) -> Vec<String> {
        self.errors.clone()
    }
}

pub struct SimulatedPlan {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,
    hooks: HookRegistry,
}

impl SimulatedPlan {
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}

pub struct SimulatedPlanBuilder {
    source: Option<EndpointConfig>,
    destination: Option<EndpointConfig>,
    hooks: HookRegistry,
}

impl PlanBuilder for SimulatedPlanBuilder {
    type Plan = SimulatedPlan;

    fn from_source(&mut self, endpoint: &EndpointConfig) {
        self.source = Some(endpoint.clone());
    }

    fn to_destination(&mut self, endpoint: &EndpointConfig) {
        self.destination = Some(endpoint.clone());
    }

    fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        match &self.source {
            Some(source) => errors.extend(source.validate("source")),
            None => errors.push("no source endpoint configured".to_string()),
        }
        match &self.destination {
            Some(destination) => errors.extend(destination.validate("destination")),
            None => errors.push("no destination endpoint configured".to_string()),
        }

        if let (Some(source), Some(destination)) = (&self.source, &self.destination) {
            if source.base_url.trim_end_matches('/') == destination.base_url.trim_end_matches('/')
                && source.site == destination.site
            {
                errors.push("source and destination point at the same site".to_string());
            }
        }

        ValidationReport { errors }
    }

    fn build(self) -> SimulatedPlan {
        SimulatedPlan {
            source: self.source.unwrap_or_else(|| EndpointConfig::new("", "", "", "")),
            destination: self
                .destination
                .unwrap_or_else(|| EndpointConfig::new("", "", "", "")),
            hooks: self.hooks,
        }
    }
}

/// Reports every item in its inventory as it was seeded (Skipped unless
/// stated otherwise). Content types without inventory produce empty batches.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    content_types: Vec<ContentType>,
    inventory: HashMap<String, Vec<BatchItem>>,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PIPELINE.iter().map(|key| ContentType::new(*key)).collect())
    }
}

impl SimulatedEngine {
    pub fn new(content_types: Vec<ContentType>) -> Self {
        Self {
            content_types,
            inventory: HashMap::new(),
        }
    }

    pub fn with_items(mut self, content_type: &str, items: Vec<BatchItem>) -> Self {
        self.inventory.insert(content_type.to_string(), items);
        self
    }

    /// Seeds `locations` as Skipped items of `content_type`, mapped to the
    /// same path on the destination.
    pub fn with_locations(self, content_type: &str, locations: &[&str]) -> Self {
        let items = locations
            .iter()
            .map(|location| BatchItem {
                source_location: location.to_string(),
                destination_location: location.to_string(),
                status: ItemStatus::Skipped,
                errors: Vec::new(),
            })
            .collect();
        self.with_items(content_type, items)
    }
}

#[async_trait]
impl MigrationEngine for SimulatedEngine {
    type Plan = SimulatedPlan;
    type Manifest = SimulatedManifest;
    type Builder = SimulatedPlanBuilder;

    fn content_types(&self) -> Vec<ContentType> {
        self.content_types.clone()
    }

    fn plan_builder(&self) -> SimulatedPlanBuilder {
        SimulatedPlanBuilder {
            source: None,
            destination: None,
            hooks: HookRegistry::default(),
        }
    }

    async fn execute(
        &self,
        plan: &SimulatedPlan,
        manifest: Option<SimulatedManifest>,
        cancel: CancellationToken,
    ) -> ExecutionOutcome<SimulatedManifest> {
        let mut manifest = manifest.unwrap_or_default();
        let hooks = plan.hooks();

        // Setup
        hooks.action_completed();

        for content_type in &self.content_types {
            if cancel.is_cancelled() {
                return ExecutionOutcome {
                    status: EngineStatus::Canceled,
                    manifest,
                };
            }

            if !manifest.completed.contains(&content_type.config_key) {
                let items = self
                    .inventory
                    .get(&content_type.config_key)
                    .cloned()
                    .unwrap_or_default();

                hooks.batch_completed(content_type, &items);

                for item in &items {
                    manifest.errors.extend(item.errors.iter().cloned());
                }
                manifest.entries.extend(items);
                manifest.completed.push(content_type.config_key.clone());
            }

            hooks.action_completed();
            tokio::task::yield_now().await;
        }

        let status = if manifest.errors.is_empty() {
            EngineStatus::Completed
        } else {
            EngineStatus::Failed
        };

        ExecutionOutcome { status, manifest }
    }

    async fn save_manifest(&self, manifest: &SimulatedManifest, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
        Ok(())
    }

    async fn load_manifest(
        &self,
        path: &Path,
        cancel: CancellationToken,
    ) -> Result<SimulatedManifest> {
        let raw = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(MigratorError::Manifest("manifest load canceled".to_string()).into());
            }
            raw = tokio::fs::read_to_string(path) => raw
                .with_context(|| format!("Failed to read manifest from {}", path.display()))?,
        };

        let manifest = serde_json::from_str(&raw)
            .with_context(|| format!("Manifest at {} is not valid", path.display()))?;
        Ok(manifest)
    }
}
