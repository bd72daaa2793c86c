// Demo runner for the `proctor_vision` library: replays a sequence of PNG
// stills through a monitored detection session and prints what a UI surface
// would show. A real deployment feeds live webcam frames instead.

use clap::{Parser, ValueEnum};
use log::{debug, info};
use proctor_vision::config::SinkConfig;
use proctor_vision::core_modules::frame::frame::{Frame, FrameSource};
use proctor_vision::core_modules::utils::image_helper::image_helper;
use proctor_vision::core_modules::violation::{JsonlSink, ViolationSink};
use proctor_vision::monitor::{MonitorConfig, PresenceMonitor, SessionEvent};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Continuous login verification (200 ms cadence).
    Login,
    /// Periodic in-exam monitoring (5 s cadence).
    ExamMonitor,
}

#[derive(Parser)]
#[command(
    name = "proctor_vision",
    about = "Replay PNG frames through the presence-detection pipeline"
)]
struct Args {
    /// PNG frames to replay, in order. The sequence loops until the session resolves.
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Which detector preset to run.
    #[arg(long, value_enum, default_value_t = Preset::Login)]
    preset: Preset,

    /// Write violation records to this file as JSON lines.
    #[arg(long)]
    violations: Option<PathBuf>,

    /// Override the preset's sampling interval, in milliseconds. Useful to
    /// replay faster than real time.
    #[arg(long)]
    interval_ms: Option<u64>,
}

/// Loops over a fixed set of decoded frames, standing in for a live camera.
struct ReplaySource {
    frames: Vec<Frame>,
    cursor: usize,
}

impl FrameSource for ReplaySource {
    fn grab_frame(&mut self) -> Option<Frame> {
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor += 1;
        Some(frame)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut frames = Vec::with_capacity(args.frames.len());
    for path in &args.frames {
        frames.push(image_helper::load(path)?);
    }
    info!("loaded {} frame(s)", frames.len());

    // Remote delivery is the hosted backend's job; we only resolve and report
    // the configuration here.
    match SinkConfig::resolve(None) {
        Ok(sink) => info!("remote violation sink configured: {}", sink.endpoint),
        Err(error) => debug!("{error}; violations stay local"),
    }

    let mut config = match args.preset {
        Preset::Login => MonitorConfig::login(),
        Preset::ExamMonitor => MonitorConfig::exam_monitor(),
    };
    if let Some(ms) = args.interval_ms {
        config.pipeline.detector.interval = Duration::from_millis(ms);
    }

    let sink: Option<Box<dyn ViolationSink>> = match &args.violations {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            Some(Box::new(JsonlSink::new(file)))
        }
        None => None,
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let source = ReplaySource {
        frames,
        cursor: 0,
    };
    let handle = PresenceMonitor::start(async move { Ok(source) }, config, sink, events_tx);

    while let Some(event) = events_rx.recv().await {
        match event {
            SessionEvent::Status {
                progress, message, ..
            } => println!("[{progress:>3}%] {message}"),
            SessionEvent::Warning(warning) => println!("warning: {warning:?}"),
            SessionEvent::Verified { auto_passed } => {
                if auto_passed {
                    println!("session verified (timeout auto-pass)");
                } else {
                    println!("session verified");
                }
                break;
            }
            SessionEvent::Aborted => {
                println!("session aborted: subject left the camera view");
                break;
            }
            SessionEvent::DetectionSkipped => {
                println!("camera unavailable, detection skipped");
            }
        }
    }

    handle.join().await?;
    Ok(())
}
