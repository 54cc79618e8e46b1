//! Frame sources — where [`FeatureFrame`]s come from.
//!
//! A source runs on its own thread and hands frames to the engine loop over
//! a bounded single-producer/single-consumer channel.  The engine loop
//! doesn't know whether frames come from the simulator or a recording.

use std::f64::consts::TAU;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use cc_engine::config::hand;
use cc_engine::{FeatureFrame, Landmark, GESTURE_LABELS};
use log::{debug, warn};

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`FeatureFrame`]s over a channel.
///
/// `run` returns when the source is exhausted or the receiver hangs up.
pub trait FrameSource: Send + 'static {
    fn run(self: Box<Self>, tx: SyncSender<FeatureFrame>);
}

/// Spawn a frame source on its own thread and return the receiving end.
///
/// At most `capacity` frames wait in the queue; beyond that the source
/// blocks, so frames are never dropped or reordered.
pub fn spawn_frame_source<S: FrameSource>(source: S, capacity: usize) -> Receiver<FeatureFrame> {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

/// Sleep until `offset` after `start`, if that is still in the future.
fn pace(start: Instant, offset: Duration) {
    if let Some(wait) = offset.checked_sub(start.elapsed()) {
        thread::sleep(wait);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource — synthetic hand
// ════════════════════════════════════════════════════════════════════════════

/// Seconds each simulated gesture segment lasts.
const SEGMENT_SECS: f64 = 1.5;
/// Part of each segment during which the label is shown.
const LABEL_SECS:   f64 = 0.5;
/// Every this many segments, the hand leaves the frame for one segment.
const LOSS_EVERY:   usize = 5;

/// A deterministic fake hand: the wrist bobs up and down, the fingers open
/// and close, a recogniser label flashes at the start of every segment and
/// the hand periodically drops out of view.
pub struct SimFrameSource {
    pub fps:      f64,
    /// Stop after this long; `None` runs until the receiver hangs up.
    pub duration: Option<Duration>,
    /// Sleep between frames to match `fps`.
    pub realtime: bool,
}

impl Default for SimFrameSource {
    fn default() -> Self {
        SimFrameSource { fps: 30.0, duration: None, realtime: true }
    }
}

impl SimFrameSource {
    /// Frame `i` of the simulation.
    pub fn frame(&self, i: u64) -> FeatureFrame {
        let t = i as f64 / self.fps.max(1.0);
        let segment = (t / SEGMENT_SECS) as usize;
        let mut frame = FeatureFrame::at_secs(t);

        if segment % LOSS_EVERY == LOSS_EVERY - 1 {
            return frame;
        }
        if t - segment as f64 * SEGMENT_SECS < LABEL_SECS {
            frame = frame.with_label(GESTURE_LABELS[segment % GESTURE_LABELS.len()]);
        }
        for (name, point) in synthetic_hand(t) {
            frame = frame.with_landmark(name, point);
        }
        frame
    }
}

impl FrameSource for SimFrameSource {
    fn run(self: Box<Self>, tx: SyncSender<FeatureFrame>) {
        let start = Instant::now();
        let fps = self.fps.max(1.0);
        for i in 0u64.. {
            let offset = Duration::from_nanos((i as f64 * 1e9 / fps) as u64);
            if self.duration.is_some_and(|d| offset > d) {
                break;
            }
            if self.realtime {
                pace(start, offset);
            }
            if tx.send(self.frame(i)).is_err() {
                return;
            }
        }
        debug!("simulation finished");
    }
}

/// All 21 landmarks of the fake hand at time `t`.
fn synthetic_hand(t: f64) -> Vec<(&'static str, Landmark)> {
    let wrist = Landmark::new(0.5, 0.6 + 0.25 * (TAU * 0.25 * t).sin());
    let mut points = vec![(hand::WRIST, wrist)];

    // Fan of five fingers pointing up from the wrist, thumb first.
    for (f, joints) in hand::ALL[1..].chunks(4).enumerate() {
        let angle = -0.9 + 0.45 * f as f64;
        let openness = 0.5 + 0.5 * (TAU * 0.5 * t + f as f64).sin();
        let reach = 0.05 + 0.25 * openness;
        for (k, name) in joints.iter().enumerate() {
            let frac = (k + 1) as f64 / 4.0;
            points.push((*name, Landmark::new(
                wrist.x + angle.sin() * reach * frac,
                wrist.y - angle.cos() * reach * frac,
            )));
        }
    }
    points
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayFrameSource — recorded NDJSON session
// ════════════════════════════════════════════════════════════════════════════

/// Replays a recording with one JSON-encoded [`FeatureFrame`] per line:
///
/// ```text
/// {"t":0.000,"labels":["Open_Palm"],"landmarks":{"wrist":{"x":0.51,"y":0.62}}}
/// {"t":0.033}
/// ```
///
/// Blank lines are skipped; malformed lines are logged and skipped.
pub struct ReplayFrameSource {
    reader:   Box<dyn BufRead + Send>,
    /// Sleep to reproduce the recorded timing.
    pub realtime: bool,
}

impl ReplayFrameSource {
    pub fn new(reader: impl BufRead + Send + 'static, realtime: bool) -> Self {
        ReplayFrameSource { reader: Box::new(reader), realtime }
    }

    pub fn open(path: impl AsRef<Path>, realtime: bool) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(ReplayFrameSource::new(BufReader::new(file), realtime))
    }
}

impl FrameSource for ReplayFrameSource {
    fn run(self: Box<Self>, tx: SyncSender<FeatureFrame>) {
        let ReplayFrameSource { reader, realtime } = *self;
        let start = Instant::now();
        let mut origin: Option<Duration> = None;

        for (n, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    warn!("replay: read error at line {}: {}", n + 1, e);
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let frame: FeatureFrame = match serde_json::from_str(&line) {
                Ok(f)  => f,
                Err(e) => {
                    warn!("replay: skipping line {}: {}", n + 1, e);
                    continue;
                }
            };
            if realtime {
                let first = *origin.get_or_insert(frame.timestamp);
                pace(start, frame.timestamp.saturating_sub(first));
            }
            if tx.send(frame).is_err() {
                return;
            }
        }
        debug!("replay finished");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
