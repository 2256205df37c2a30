// src/readiness/mod.rs
mod orchestrator;

pub use orchestrator::{Orchestrator, ReadinessReport, StageFailed, StageReport};
