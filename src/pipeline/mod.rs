//! Extraction pipeline: sequential per-email orchestration, then
//! consolidation of duplicate tasks.

pub mod consolidate;
pub mod orchestrator;
