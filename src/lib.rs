// ABOUTME: Library entry point for the content migrator
// ABOUTME: Orchestrates engine-driven migrations with progress, timing and error reporting

pub mod bus;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod orchestrator;
pub mod parser;
pub mod progress;
pub mod timer;

pub use bus::{MessageLog, ProgressMessage, ProgressMessageBus, SubscriptionId};
pub use catalog::ActionCatalog;
pub use config::{EndpointConfig, MigratorConfig};
pub use engine::{
    BatchItem, ContentType, EngineManifest, EngineStatus, ExecutionOutcome, ItemStatus,
    MigrationEngine, PlanBuilder, SimulatedEngine, ValidationReport,
};
pub use error::{FormatError, MigratorError};
pub use hooks::HookRegistry;
pub use orchestrator::{DetailedResult, MigrationOrchestrator, OrchestratorOptions, ResultStatus};
pub use parser::ParsedError;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use timer::{Clock, MigrationTimer, SystemClock};
