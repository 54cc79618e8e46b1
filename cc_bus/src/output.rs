//! MIDI output backends and port discovery.
//!
//! [`MidiOut`] hides whether messages go to a real port (`midir`), nowhere
//! ([`NullOut`]) or into memory ([`RecordingOut`]).

use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::error::BusError;

const CLIENT_NAME: &str = "hand_cc";

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null / recording
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn send(&mut self, message: &[u8]) -> Result<(), BusError>;

    /// Port name, for status lines.
    fn name(&self) -> &str;
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirOut {
    conn: midir::MidiOutputConnection,
    name: String,
}

impl MidiOut for MidirOut {
    fn send(&mut self, message: &[u8]) -> Result<(), BusError> {
        self.conn.send(message)?;
        Ok(())
    }

    fn name(&self) -> &str { &self.name }
}

// ── null backend (no port available) ──────────────────────────────────────

#[derive(Debug, Default)]
pub struct NullOut;

impl MidiOut for NullOut {
    fn send(&mut self, _message: &[u8]) -> Result<(), BusError> { Ok(()) }
    fn name(&self) -> &str { "null" }
}

// ── recording backend (dry runs and tests) ────────────────────────────────

/// Keeps every message in memory.  Clones share the same log, so a caller
/// can hand one to the bus and inspect the other.
#[derive(Clone, Debug, Default)]
pub struct RecordingOut {
    log: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingOut {
    pub fn new() -> Self { RecordingOut::default() }

    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.lock().clone()
    }

    /// Take everything recorded so far.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        // A panicking test thread must not hide what was recorded.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MidiOut for RecordingOut {
    fn send(&mut self, message: &[u8]) -> Result<(), BusError> {
        self.lock().push(message.to_vec());
        Ok(())
    }

    fn name(&self) -> &str { "recording" }
}

// ════════════════════════════════════════════════════════════════════════════
// Port discovery
// ════════════════════════════════════════════════════════════════════════════

/// How to pick an output port.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PortSelector {
    /// Prefer a software synth or virtual cable; fall back to the first
    /// port; fall back to [`NullOut`] if there are none.
    #[default]
    Auto,
    /// First port whose name contains this text (case-insensitive).
    /// Missing is an error.
    Named(String),
}

impl PortSelector {
    /// `"auto"` or empty → [`Auto`](Self::Auto), anything else → [`Named`](Self::Named).
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            PortSelector::Auto
        } else {
            PortSelector::Named(s.to_string())
        }
    }
}

/// Names of every MIDI output port currently visible.
pub fn list_output_ports() -> Result<Vec<String>, BusError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)?;
    midi_out.ports().iter()
        .map(|p| midi_out.port_name(p).map_err(BusError::from))
        .collect()
}

/// Index of the port `selector` wants among `names`.
///
/// `Ok(None)` means "no ports at all, use the null backend".
fn choose_port(names: &[String], selector: &PortSelector) -> Result<Option<usize>, BusError> {
    match selector {
        PortSelector::Named(wanted) => {
            let needle = wanted.to_lowercase();
            names.iter()
                .position(|n| n.to_lowercase().contains(&needle))
                .map(Some)
                .ok_or_else(|| BusError::PortNotFound {
                    wanted:    wanted.clone(),
                    available: names.to_vec(),
                })
        }
        PortSelector::Auto => {
            if names.is_empty() {
                return Ok(None);
            }
            let preferred = names.iter().position(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("loopmidi") || n.contains("iac") ||
                n.contains("virtual") || n.contains("synth")
            });
            Ok(Some(preferred.unwrap_or(0)))
        }
    }
}

/// Open an output port according to `selector`.
pub fn open_output(selector: &PortSelector) -> Result<Box<dyn MidiOut>, BusError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)?;
    let ports = midi_out.ports();
    let names = ports.iter()
        .map(|p| midi_out.port_name(p))
        .collect::<Result<Vec<_>, _>>()?;

    let idx = match choose_port(&names, selector)? {
        Some(i) => i,
        None => {
            warn!("no MIDI output ports found, control changes will be discarded");
            warn!("create a virtual port (IAC Driver on macOS, loopMIDI on Windows, `modprobe snd-virmidi` on Linux)");
            return Ok(Box::new(NullOut));
        }
    };

    let name = names[idx].clone();
    info!("opening MIDI port: {}", name);
    let conn = midi_out
        .connect(&ports[idx], "hand-cc-out")
        .map_err(|e| BusError::Connect { port: name.clone(), reason: e.to_string() })?;
    Ok(Box::new(MidirOut { conn, name }))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
