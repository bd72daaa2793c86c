// THEORY:
// This file is the main entry point for the `proctor_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the exam login flow and the
// in-exam monitoring surface).
//
// The primary goal is to export the `DetectionPipeline`, the async
// `PresenceMonitor` runtime and their associated data structures
// (`PipelineConfig`, `Report`, `SessionEvent`, etc.) as the clean, high-level
// interface for the presence-detection engine. The internal analysis modules
// (`core_modules`) stay encapsulated behind them.

pub mod config;
pub mod core_modules;
pub mod monitor;
pub mod pipeline;
