// End-to-end tests for the monitored session runtime: camera acquisition
// fallbacks, the sampling loop, violation forwarding and lifecycle.

use proctor_vision::core_modules::frame::frame::{Frame, FrameSource};
use proctor_vision::core_modules::violation::{ViolationKind, ViolationRecord, ViolationSink};
use proctor_vision::monitor::{MonitorConfig, MonitorError, PresenceMonitor, SessionEvent};
use proctor_vision::pipeline::Warning;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// 200x200 lit gray frame with a centered 60x60 skin patch.
fn skin_frame() -> Frame {
    let (width, height) = (200u32, 200u32);
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&[120, 120, 120, 255]);
    }
    for y in 70..130u32 {
        for x in 70..130u32 {
            let i = ((y * width + x) * 4) as usize;
            data[i..i + 4].copy_from_slice(&[200, 150, 120, 255]);
        }
    }
    Frame::new(width, height, data)
}

fn dark_frame() -> Frame {
    Frame::new(200, 200, vec![0u8; 200 * 200 * 4])
}

/// A camera stand-in that serves one fixed frame forever, counting how many
/// times it gets released.
struct StubSource {
    frame: Option<Frame>,
    releases: Arc<AtomicUsize>,
}

impl FrameSource for StubSource {
    fn grab_frame(&mut self) -> Option<Frame> {
        self.frame.clone()
    }
}

impl Drop for StubSource {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<ViolationRecord>>>);

impl ViolationSink for SharedSink {
    fn record(&mut self, violation: &ViolationRecord) {
        self.0.lock().unwrap().push(violation.clone());
    }
}

fn fast_login() -> MonitorConfig {
    let mut config = MonitorConfig::login();
    config.pipeline.detector.interval = Duration::from_millis(5);
    config
}

async fn drain_until_terminal(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let terminal = matches!(
            event,
            SessionEvent::Verified { .. } | SessionEvent::Aborted
        );
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

#[tokio::test]
async fn clean_session_reaches_verified() {
    let releases = Arc::new(AtomicUsize::new(0));
    let source = StubSource {
        frame: Some(skin_frame()),
        releases: releases.clone(),
    };
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = PresenceMonitor::start(async move { Ok(source) }, fast_login(), None, tx);
    let events = drain_until_terminal(&mut rx).await;
    handle.join().await.expect("monitor task must finish");

    match events.last() {
        Some(SessionEvent::Verified { auto_passed }) => assert!(!auto_passed),
        other => panic!("expected Verified, got {other:?}"),
    }
    // 50 clean ticks at +2 progress each.
    let status_count = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Status { .. }))
        .count();
    assert_eq!(status_count, 50);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn denied_camera_skips_detection_and_auto_passes() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let acquire = async {
        Err::<StubSource, _>(MonitorError::CameraUnavailable(
            "permission denied".to_string(),
        ))
    };

    let handle = PresenceMonitor::start(acquire, fast_login(), None, tx);
    let events = drain_until_terminal(&mut rx).await;
    handle.join().await.expect("monitor task must finish");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], SessionEvent::DetectionSkipped);
    assert_eq!(events[1], SessionEvent::Verified { auto_passed: true });
}

#[tokio::test]
async fn silent_camera_skips_detection_after_the_grace_period() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut config = fast_login();
    config.acquisition_grace = Duration::from_millis(20);

    let acquire = std::future::pending::<Result<StubSource, MonitorError>>();
    let handle = PresenceMonitor::start(acquire, config, None, tx);
    let events = drain_until_terminal(&mut rx).await;
    handle.join().await.expect("monitor task must finish");

    assert_eq!(events[0], SessionEvent::DetectionSkipped);
    assert_eq!(events[1], SessionEvent::Verified { auto_passed: true });
}

#[tokio::test]
async fn sustained_absence_aborts_and_records_one_violation() {
    let releases = Arc::new(AtomicUsize::new(0));
    let source = StubSource {
        frame: Some(dark_frame()),
        releases: releases.clone(),
    };
    let sink = SharedSink::default();
    let records = sink.0.clone();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = PresenceMonitor::start(
        async move { Ok(source) },
        fast_login(),
        Some(Box::new(sink)),
        tx,
    );
    let events = drain_until_terminal(&mut rx).await;
    handle.join().await.expect("monitor task must finish");

    assert_eq!(events.last(), Some(&SessionEvent::Aborted));
    let warning_count = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Warning(Warning::NoFace)))
        .count();
    assert_eq!(warning_count, 1, "absence warning must be edge-triggered");

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ViolationKind::FaceAbsent);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_is_idempotent_and_releases_the_camera_once() {
    let releases = Arc::new(AtomicUsize::new(0));
    let source = StubSource {
        frame: None,
        releases: releases.clone(),
    };
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handle = PresenceMonitor::start(async move { Ok(source) }, fast_login(), None, tx);
    tokio::time::sleep(Duration::from_millis(25)).await;

    handle.stop();
    handle.stop();
    handle.join().await.expect("monitor task must finish");

    assert_eq!(releases.load(Ordering::SeqCst), 1);
    // A stopped session resolves nothing: no terminal event was emitted.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn stalled_camera_times_out_into_auto_pass() {
    let releases = Arc::new(AtomicUsize::new(0));
    let source = StubSource {
        frame: None,
        releases: releases.clone(),
    };
    let mut config = fast_login();
    config.pipeline.interpreter.session_timeout = Duration::from_millis(30);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = PresenceMonitor::start(async move { Ok(source) }, config, None, tx);
    let events = drain_until_terminal(&mut rx).await;
    handle.join().await.expect("monitor task must finish");

    assert_eq!(
        events.last(),
        Some(&SessionEvent::Verified { auto_passed: true })
    );
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}
