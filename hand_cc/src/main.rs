//! hand_cc — command-line entry point.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cc_bus::{
    describe, list_output_ports, open_output, BusError, ControlBus, MidiOut, PortSelector,
    SessionCapture,
};
use hand_cc::source::SimFrameSource;
use hand_cc::{run, spawn_frame_source, AppConfig, AppError, ReplayFrameSource};

const USAGE: &str = "\
usage: hand_cc [options]

  --config FILE     load channel tables / port from a TOML file
  --preset NAME     gestures (default) or hand; not with --config
  --port NAME       MIDI output port (substring match) or \"auto\"
  --list-ports      print MIDI output ports and exit
  --replay FILE     replay recorded frames (one JSON frame per line)
  --realtime        pace frames to their timestamps (default; overrides --fast)
  --fast            don't pace frames to their timestamps
  --seconds N       stop the simulator after N seconds
  --dry-run         print control changes instead of sending them
  --record FILE     also save the control changes as a .mid file
  -h, --help        this text

Type q + Enter to quit.";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config:     Option<PathBuf>,
    preset:     Option<String>,
    port:       Option<String>,
    list_ports: bool,
    replay:     Option<PathBuf>,
    realtime:   bool,
    fast:       bool,
    seconds:    Option<f64>,
    dry_run:    bool,
    record:     Option<PathBuf>,
}

impl Args {
    /// Sleep between frames to follow their timestamps.
    fn paced(&self) -> bool {
        self.realtime || !self.fast
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          hand_cc — Hand Gesture → MIDI Control Change        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    if let Err(e) = real_main() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), AppError> {
    let args = parse_args(std::env::args().skip(1))?;

    let ports = list_output_ports().unwrap_or_else(|e| {
        log::warn!("could not enumerate MIDI ports: {}", e);
        Vec::new()
    });
    println!("  Available MIDI output ports:");
    if ports.is_empty() {
        println!("    (none)");
    }
    for (i, p) in ports.iter().enumerate() {
        println!("    {}. {}", i + 1, p);
    }
    println!();
    if args.list_ports {
        return Ok(());
    }

    let mut cfg = match (&args.config, &args.preset) {
        (Some(path), _)    => AppConfig::load(path)?,
        (None, Some(name)) => AppConfig::preset(name)?,
        (None, None)       => AppConfig::default(),
    };
    if let Some(port) = &args.port {
        cfg.port = PortSelector::parse(port);
    }

    let out: Box<dyn MidiOut> = if args.dry_run {
        Box::new(PrintOut)
    } else {
        open_output(&cfg.port)?
    };
    let mut bus = ControlBus::new(out, cfg.wire.clone());
    if args.record.is_some() {
        bus = bus.with_capture(SessionCapture::default());
    }

    let frames = match &args.replay {
        Some(path) => {
            let src = ReplayFrameSource::open(path, args.paced())
                .map_err(|source| AppError::Replay { path: path.display().to_string(), source })?;
            println!("  Source: replay {}", path.display());
            spawn_frame_source(src, cfg.queue_capacity)
        }
        None => {
            let sim = SimFrameSource {
                duration: args.seconds.map(Duration::from_secs_f64),
                realtime: args.paced(),
                ..SimFrameSource::default()
            };
            println!("  Source: simulated hand ({} fps)", sim.fps);
            spawn_frame_source(sim, cfg.queue_capacity)
        }
    };
    println!("  Output: {}", bus.port_name());
    println!();

    let stop = Arc::new(AtomicBool::new(false));
    watch_for_quit(Arc::clone(&stop));

    let summary = run(&cfg, frames, &mut bus, &stop)?;

    println!();
    println!(
        "  {} frames, {} control changes, {} held, {} send errors",
        summary.frames, summary.emissions, summary.skipped, summary.send_errors
    );

    if let (Some(path), Some(capture)) = (&args.record, bus.take_capture()) {
        capture.write_file(path)?;
        println!("  ✓  Saved {} messages to '{}'", capture.len(), path.display());
    }
    Ok(())
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, AppError> {
    let mut args = Args::default();
    while let Some(a) = it.next() {
        let mut value = |flag: &str| {
            it.next().ok_or_else(|| AppError::Usage(format!("{} needs a value\n\n{}", flag, USAGE)))
        };
        match a.as_str() {
            "--config"     => args.config  = Some(value("--config")?.into()),
            "--preset"     => args.preset  = Some(value("--preset")?),
            "--port"       => args.port    = Some(value("--port")?),
            "--replay"     => args.replay  = Some(value("--replay")?.into()),
            "--record"     => args.record  = Some(value("--record")?.into()),
            "--seconds"    => {
                let v = value("--seconds")?;
                let secs = v.parse::<f64>().ok().filter(|s| s.is_finite() && *s > 0.0)
                    .ok_or_else(|| AppError::Usage(format!("--seconds: bad value {:?}", v)))?;
                args.seconds = Some(secs);
            }
            "--list-ports" => args.list_ports = true,
            "--realtime"   => args.realtime   = true,
            "--fast"       => args.fast       = true,
            "--dry-run"    => args.dry_run    = true,
            "-h" | "--help" => return Err(AppError::Usage(USAGE.to_string())),
            other => return Err(AppError::Usage(format!("unknown option {:?}\n\n{}", other, USAGE))),
        }
    }
    if args.config.is_some() && args.preset.is_some() {
        return Err(AppError::Usage(
            "--config and --preset can't be combined; set `preset = ...` in the file".to_string(),
        ));
    }
    Ok(args)
}

/// Raise `stop` when the user types `q`.
fn watch_for_quit(stop: Arc<AtomicBool>) {
    thread::spawn(move || {
        // EOF (stdin not a terminal) just ends the watcher.
        for line in io::stdin().lock().lines() {
            match line {
                Ok(l) if l.trim().eq_ignore_ascii_case("q") => {
                    stop.store(true, Ordering::Relaxed);
                    return;
                }
                Ok(_)  => continue,
                Err(_) => return,
            }
        }
    });
}

/// `--dry-run` backend: one line per message on stdout.
struct PrintOut;

impl MidiOut for PrintOut {
    fn send(&mut self, message: &[u8]) -> Result<(), BusError> {
        println!("  {}", describe(message));
        Ok(())
    }

    fn name(&self) -> &str { "stdout (dry run)" }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
