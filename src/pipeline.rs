// THEORY:
// The `pipeline` module is the top-level API for the presence-detection engine.
// It composes the two pure stages (frame analysis, multi-person rules) with the
// one stateful stage (the interpreter) behind a single entry point: hand in a
// frame, get back a `Report` describing where the session now stands and which
// violations, if any, this tick produced.
//
// The two production call sites of the heuristic never agreed on tuning: the
// continuous login detector runs every 200 ms over a coarse pixel lattice,
// while the in-exam monitor wakes every 5 seconds and walks flattened indices.
// Rather than pretending they are the same detector, both tunings ship as
// named presets: `PipelineConfig::login()` and `PipelineConfig::exam_monitor()`.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::frame_analyzer;
use crate::core_modules::interpreter::PresenceInterpreter;
use crate::core_modules::multi_person::MultiPersonRules;
use crate::core_modules::occupancy_grid::DEFAULT_BLOCK_SIZE;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// Re-export key data structures for the public API.
pub use crate::core_modules::frame_analyzer::{ClassificationResult, FrameAnalysis};
pub use crate::core_modules::interpreter::{
    InterpreterConfig, SessionState, TickOutcome, Warning,
};
pub use crate::core_modules::violation::{ViolationKind, ViolationRecord};

/// How the classifier walks the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingStride {
    /// Sample every Nth pixel in both x and y (a coarse lattice).
    Lattice(u32),
    /// Sample every Nth flattened pixel index.
    Flat(u32),
}

/// Thresholds for the coarse lighting/movement heuristic the exam monitor runs
/// alongside presence detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingRules {
    /// Brightness above which a sampled pixel counts as "hot".
    pub brightness_threshold: f64,
    /// Hot-pixel ratio above which the frame is flagged as suspicious.
    pub max_bright_ratio: f64,
}

/// Full tuning of the classifier stage. The constants are an empirically tuned
/// behavioral contract; prefer the presets over hand-rolled values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Wall-clock spacing between sampling ticks.
    pub interval: Duration,
    pub stride: SamplingStride,
    /// Edge length of one occupancy-grid block, in source pixels.
    pub block_size: u32,
    /// Central face-region radius as a fraction of min(width, height).
    pub face_region_scale: f64,
    /// Brightness floor for the good-lighting gate.
    pub bright_pixel_floor: f64,
    /// Open interval the skin fraction must fall in for a face.
    pub min_skin_fraction: f64,
    pub max_skin_fraction: f64,
    /// Minimum share of skin pixels that must sit in the central region.
    pub min_face_region_fraction: f64,
    /// Minimum share of sampled pixels that must clear the brightness floor.
    pub min_bright_fraction: f64,
    /// Open interval the central-region pixel count must fall in.
    pub min_face_region_pixels: usize,
    pub max_face_region_pixels: usize,
    pub multi_person: MultiPersonRules,
    /// Present only for the exam-monitor preset.
    pub lighting: Option<LightingRules>,
}

/// Configuration for one detection pipeline: classifier tuning plus the
/// session state-machine policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub interpreter: InterpreterConfig,
}

impl PipelineConfig {
    /// The continuous login/verification detector: fast cadence, coarse
    /// lattice, conservative multi-person thresholds.
    pub fn login() -> Self {
        Self {
            detector: DetectorConfig {
                interval: Duration::from_millis(200),
                stride: SamplingStride::Lattice(3),
                block_size: DEFAULT_BLOCK_SIZE,
                face_region_scale: 0.3,
                bright_pixel_floor: 50.0,
                min_skin_fraction: 0.04,
                max_skin_fraction: 0.35,
                min_face_region_fraction: 0.25,
                min_bright_fraction: 0.3,
                min_face_region_pixels: 15,
                max_face_region_pixels: 800,
                multi_person: MultiPersonRules {
                    candidate_density: 8,
                    significant_density: 30,
                    min_significant_regions: 3,
                    pair_distance: 6.0,
                    pair_density: 25,
                    side_density: 22,
                },
                lighting: None,
            },
            interpreter: InterpreterConfig::default(),
        }
    }

    /// The periodic in-exam monitor: slow cadence, flat stride, twitchier
    /// multi-person thresholds, plus the lighting heuristic.
    pub fn exam_monitor() -> Self {
        Self {
            detector: DetectorConfig {
                interval: Duration::from_secs(5),
                stride: SamplingStride::Flat(4),
                block_size: DEFAULT_BLOCK_SIZE,
                face_region_scale: 0.3,
                bright_pixel_floor: 50.0,
                min_skin_fraction: 0.04,
                max_skin_fraction: 0.35,
                min_face_region_fraction: 0.25,
                min_bright_fraction: 0.3,
                min_face_region_pixels: 15,
                max_face_region_pixels: 800,
                multi_person: MultiPersonRules {
                    candidate_density: 8,
                    significant_density: 8,
                    min_significant_regions: 2,
                    pair_distance: 6.0,
                    pair_density: 25,
                    side_density: 22,
                },
                lighting: Some(LightingRules {
                    brightness_threshold: 100.0,
                    max_bright_ratio: 0.8,
                }),
            },
            interpreter: InterpreterConfig::default(),
        }
    }
}

/// Everything one processed tick produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickData {
    pub classification: ClassificationResult,
    pub outcome: TickOutcome,
    /// True when the lighting heuristic flagged this frame.
    pub lighting_anomaly: bool,
    /// Violation records this tick produced (edge-triggered, never repeated
    /// while a condition persists).
    pub violations: Vec<ViolationRecord>,
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The frame was zero-sized or the source not ready; session state is unchanged.
    NotReady,
    Tick(TickData),
}

/// The main, top-level struct for the presence-detection engine.
pub struct DetectionPipeline {
    config: PipelineConfig,
    interpreter: PresenceInterpreter,
}

impl DetectionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let interpreter = PresenceInterpreter::new(config.interpreter.clone());
        Self {
            config,
            interpreter,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn progress(&self) -> u8 {
        self.interpreter.progress()
    }

    pub fn state(&self) -> SessionState {
        self.interpreter.state()
    }

    pub fn is_verified(&self) -> bool {
        self.interpreter.is_verified()
    }

    /// Runs one full sampling tick: classify the frame, advance the session,
    /// collect any violations the tick produced.
    pub fn process_frame(&mut self, frame: &Frame) -> Report {
        self.process_frame_at(frame, Instant::now())
    }

    /// `process_frame` with an explicit clock, so timeout behavior is testable.
    pub fn process_frame_at(&mut self, frame: &Frame, now: Instant) -> Report {
        if !frame.is_ready() {
            return Report::NotReady;
        }

        let analysis = frame_analyzer::analyze(frame, &self.config.detector);
        let outcome = self.interpreter.tick_at(&analysis.classification, now);

        let mut violations = Vec::new();
        match outcome.warning {
            Some(Warning::MultiplePeople) => violations.push(ViolationRecord::multiple_people()),
            Some(Warning::NoFace) => violations.push(ViolationRecord::face_absent()),
            None => {}
        }
        if analysis.lighting_anomaly {
            violations.push(ViolationRecord::suspicious_activity());
        }

        Report::Tick(TickData {
            classification: analysis.classification,
            outcome,
            lighting_anomaly: analysis.lighting_anomaly,
            violations,
        })
    }

    /// Gives the session its timeout check when no ready frame arrived this
    /// tick. Returns the forced-verification outcome at most once.
    pub fn check_timeout_at(&mut self, now: Instant) -> Option<TickOutcome> {
        self.interpreter.force_verify_at(now)
    }

    /// Discards session state for an explicit caller-driven restart.
    pub fn restart(&mut self) {
        self.interpreter.restart();
    }
}
