// THEORY:
// The `monitor` module is the session runtime around the synchronous pipeline.
// It owns the three asynchronous concerns the pipeline itself stays free of:
//
// 1.  **Acquisition**: the camera is acquired exactly once, at start, under a
//     bounded grace period. A denied permission or a device that never
//     produces a frame must not block a legitimate user, so both paths fall
//     back to an auto-verified session ("detection skipped") instead of
//     failing hard.
// 2.  **Cadence**: a tokio interval drives one synchronous tick per period.
//     Ticks never overlap; a missed tick is delayed, not burst.
// 3.  **Lifecycle**: `stop()` cancels the pending timer and drops the frame
//     source, which releases the capture device. Release also happens on every
//     other termination path because the source lives inside the task. Stop is
//     idempotent.
//
// Callers watch the session through a channel of `SessionEvent`s and, when
// monitoring an exam, attach a `ViolationSink` that receives flagged records.

use crate::core_modules::frame::frame::FrameSource;
use crate::core_modules::violation::ViolationSink;
use crate::pipeline::{DetectionPipeline, PipelineConfig, Report, SessionState, Warning};
use log::{debug, info, warn};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default bounded wait for the capture device to come up.
const DEFAULT_ACQUISITION_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The capture device could not be acquired (e.g. permission denied).
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    /// No frame source became ready within the acquisition grace period.
    #[error("camera acquisition timed out after {0:?}")]
    AcquisitionTimeout(Duration),
    /// The monitor task ended without resolving the session.
    #[error("monitor task ended before the session resolved")]
    SessionInterrupted,
}

/// Configuration for a monitored session.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub pipeline: PipelineConfig,
    /// How long to wait for the camera before falling back to auto-pass.
    pub acquisition_grace: Duration,
}

impl MonitorConfig {
    pub fn login() -> Self {
        Self {
            pipeline: PipelineConfig::login(),
            acquisition_grace: DEFAULT_ACQUISITION_GRACE,
        }
    }

    pub fn exam_monitor() -> Self {
        Self {
            pipeline: PipelineConfig::exam_monitor(),
            acquisition_grace: DEFAULT_ACQUISITION_GRACE,
        }
    }
}

/// What a running session reports back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// One sampling tick completed; suitable for a UI status surface.
    Status {
        progress: u8,
        state: SessionState,
        message: String,
    },
    /// The session entered a warning condition (edge-triggered).
    Warning(Warning),
    /// The session reached Verified. Terminal.
    Verified { auto_passed: bool },
    /// The session aborted after sustained absence. Terminal; a new session
    /// requires an explicit restart by the caller.
    Aborted,
    /// The camera never became available; detection was skipped entirely.
    DetectionSkipped,
}

/// Handle to a running session. Dropping the handle stops the session as a
/// best effort; call `stop` for the explicit path.
pub struct SessionHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Cancels the pending sampling timer and releases the capture device.
    /// Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Waits for the monitor task to finish.
    pub async fn join(mut self) -> Result<(), MonitorError> {
        match self.task.take() {
            Some(task) => task.await.map_err(|_| MonitorError::SessionInterrupted),
            None => Ok(()),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // Best effort stop on drop, so an abandoned handle cannot leak the camera.
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// The entry point for running a monitored detection session.
pub struct PresenceMonitor;

impl PresenceMonitor {
    /// Starts a session: acquire the camera (bounded by the grace period),
    /// then drive the pipeline once per sampling interval until the session
    /// resolves or `stop` is called.
    ///
    /// `acquire` resolves to the frame source once the capture device is up.
    /// Violations are forwarded to `sink` as they are flagged.
    pub fn start<S, F>(
        acquire: F,
        config: MonitorConfig,
        sink: Option<Box<dyn ViolationSink>>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> SessionHandle
    where
        S: FrameSource + Send + 'static,
        F: Future<Output = Result<S, MonitorError>> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut pipeline = DetectionPipeline::new(config.pipeline.clone());
            let mut sink = sink;

            let mut source = match tokio::time::timeout(config.acquisition_grace, acquire).await {
                Ok(Ok(source)) => source,
                Ok(Err(error)) => {
                    warn!("camera acquisition failed: {error}; skipping detection");
                    let _ = events.send(SessionEvent::DetectionSkipped);
                    let _ = events.send(SessionEvent::Verified { auto_passed: true });
                    return;
                }
                Err(_) => {
                    warn!(
                        "camera produced no frame source within {:?}; skipping detection",
                        config.acquisition_grace
                    );
                    let _ = events.send(SessionEvent::DetectionSkipped);
                    let _ = events.send(SessionEvent::Verified { auto_passed: true });
                    return;
                }
            };

            info!("presence monitoring started");
            let mut interval = tokio::time::interval(config.pipeline.detector.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        info!("presence monitoring stopped by caller");
                        break;
                    }
                    _ = interval.tick() => {
                        // The session deadline holds even while the source
                        // produces nothing.
                        if let Some(outcome) = pipeline.check_timeout_at(Instant::now()) {
                            let _ = events.send(SessionEvent::Status {
                                progress: outcome.progress,
                                state: outcome.state,
                                message: outcome.status_line(),
                            });
                            let _ = events.send(SessionEvent::Verified { auto_passed: true });
                            break;
                        }

                        let Some(frame) = source.grab_frame() else {
                            debug!("camera not ready, skipping tick");
                            continue;
                        };

                        let Report::Tick(tick) = pipeline.process_frame(&frame) else {
                            debug!("frame not ready, skipping tick");
                            continue;
                        };

                        if let Some(sink) = sink.as_mut() {
                            for violation in &tick.violations {
                                sink.record(violation);
                            }
                        }

                        debug!(
                            "tick: progress {}%, state {:?}, confidence {:.0}",
                            tick.outcome.progress, tick.outcome.state, tick.classification.confidence
                        );
                        let _ = events.send(SessionEvent::Status {
                            progress: tick.outcome.progress,
                            state: tick.outcome.state,
                            message: tick.outcome.status_line(),
                        });
                        if let Some(warning) = tick.outcome.warning {
                            let _ = events.send(SessionEvent::Warning(warning));
                        }

                        if tick.outcome.just_verified {
                            let _ = events.send(SessionEvent::Verified {
                                auto_passed: tick.outcome.auto_passed,
                            });
                            break;
                        }
                        if tick.outcome.state == SessionState::Aborted {
                            let _ = events.send(SessionEvent::Aborted);
                            break;
                        }
                    }
                }
            }

            // Dropping the source here releases the capture device on every
            // termination path.
            drop(source);
        });

        SessionHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}
