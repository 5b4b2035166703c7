//! Application layer: run orchestration over the infrastructure services.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
