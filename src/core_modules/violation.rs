// THEORY:
// Violation records are the pipeline's only durable output. The interpreter and
// monitor emit them; they never store them. Where they end up (a hosted
// database, a log file, an in-memory buffer for tests) is the sink's business,
// behind the narrow `ViolationSink` trait.

use log::warn;
use serde::Serialize;
use std::io::Write;
use std::time::SystemTime;

/// The classes of suspicious activity the monitor can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// More than one person visible in the webcam frame.
    MultiplePeople,
    /// The student left the camera view.
    FaceAbsent,
    /// Unusual lighting or movement in the monitored frame.
    SuspiciousActivity,
}

/// One flagged event, as handed to the external monitoring collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationRecord {
    pub kind: ViolationKind,
    pub description: String,
    pub timestamp: SystemTime,
}

impl ViolationRecord {
    pub fn new(kind: ViolationKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn multiple_people() -> Self {
        Self::new(
            ViolationKind::MultiplePeople,
            "Multiple people detected in camera view",
        )
    }

    pub fn face_absent() -> Self {
        Self::new(ViolationKind::FaceAbsent, "Student not visible in camera view")
    }

    pub fn suspicious_activity() -> Self {
        Self::new(
            ViolationKind::SuspiciousActivity,
            "Unusual lighting or movement detected",
        )
    }
}

/// Receiver of violation records. The monitor calls this once per flagged
/// event; implementations decide durability.
pub trait ViolationSink: Send {
    fn record(&mut self, violation: &ViolationRecord);
}

/// Keeps records in memory. Used by tests and as a buffer for callers that
/// upload in batches at submission time.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<ViolationRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }
}

impl ViolationSink for MemorySink {
    fn record(&mut self, violation: &ViolationRecord) {
        self.records.push(violation.clone());
    }
}

/// Writes each record as one JSON line. A failed write is logged and dropped;
/// monitoring must never take down the exam session itself.
pub struct JsonlSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> ViolationSink for JsonlSink<W> {
    fn record(&mut self, violation: &ViolationRecord) {
        match serde_json::to_string(violation) {
            Ok(line) => {
                if let Err(error) = writeln!(self.writer, "{line}") {
                    warn!("failed to persist violation record: {error}");
                }
            }
            Err(error) => warn!("failed to serialize violation record: {error}"),
        }
    }
}
