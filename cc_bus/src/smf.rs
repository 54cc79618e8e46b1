//! Capture a control session to a Standard MIDI File.
//!
//! Every message that goes out on the bus can also be appended here with
//! its frame timestamp; [`SessionCapture::write_file`] produces a Type-0 file
//! that any DAW can import to audition or edit the gesture automation.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::BusError;

pub const DEFAULT_TICKS_PER_QUARTER: u16 = 480;
pub const DEFAULT_TEMPO_BPM:         u32 = 120;

/// Timestamped raw MIDI messages, in arrival order.
#[derive(Clone, Debug)]
pub struct SessionCapture {
    events:            Vec<(Duration, Vec<u8>)>,
    ticks_per_quarter: u16,
    tempo_bpm:         u32,
    name:              String,
}

impl Default for SessionCapture {
    fn default() -> Self {
        SessionCapture::new("hand_cc session")
    }
}

impl SessionCapture {
    pub fn new(name: impl Into<String>) -> Self {
        SessionCapture {
            events:            Vec::new(),
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            tempo_bpm:         DEFAULT_TEMPO_BPM,
            name:              name.into(),
        }
    }

    pub fn record(&mut self, at: Duration, message: &[u8]) {
        self.events.push((at, message.to_vec()));
    }

    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    fn ticks_at(&self, at: Duration) -> u64 {
        let ticks_per_sec = self.ticks_per_quarter as f64 * self.tempo_bpm as f64 / 60.0;
        (at.as_secs_f64() * ticks_per_sec).round() as u64
    }

    /// Serialise to a Type-0 MIDI file.
    ///
    /// Time starts at the first captured event.  Out-of-order timestamps
    /// are written with a zero delta rather than reordered.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();

        let mut out = Vec::new();
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), BusError> {
        let mut f = std::fs::File::create(path)?;
        f.write_all(&self.to_bytes())?;
        Ok(())
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();

        // ── Tempo ─────────────────────────────────────────────────────────
        let micros = 60_000_000u32 / self.tempo_bpm.max(1);
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.extend_from_slice(&micros.to_be_bytes()[1..]);

        // ── Track name ────────────────────────────────────────────────────
        let name = self.name.as_bytes();
        t.extend_from_slice(&[0x00, 0xFF, 0x03]);
        write_vlq(&mut t, name.len() as u32);
        t.extend_from_slice(name);

        // ── Captured messages ─────────────────────────────────────────────
        let origin = self.events.first().map(|(at, _)| self.ticks_at(*at)).unwrap_or(0);
        let mut last = origin;
        for (at, message) in &self.events {
            let now = self.ticks_at(*at).max(last);
            write_vlq(&mut t, (now - last).min(0x0FFF_FFFF) as u32);
            t.extend_from_slice(message);
            last = now;
        }

        // ── End of track ──────────────────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }
}

/// Write a MIDI variable-length quantity.
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 4];
    let mut i = 3;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlq_encodings() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x40);
        assert_eq!(b, [0x40]);

        let mut b = Vec::new();
        write_vlq(&mut b, 960);
        assert_eq!(b, [0x87, 0x40]);
    }

    #[test]
    fn header_and_end_of_track() {
        let mut cap = SessionCapture::new("t");
        cap.record(Duration::ZERO, &[0xB0, 1, 64]);
        let bytes = cap.to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..10], &[0, 0]);
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
        assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn deltas_follow_timestamps() {
        let mut cap = SessionCapture::new("");
        cap.record(Duration::from_secs(3), &[0xB0, 1, 10]);
        cap.record(Duration::from_secs(4), &[0xB0, 1, 20]);
        // 120 BPM at 480 tpq → 960 ticks per second
        let bytes = cap.to_bytes();
        let second = [0x87, 0x40, 0xB0, 1, 20];
        assert!(bytes.windows(second.len()).any(|w| w == second));
        // first event sits at delta 0
        let first = [0x00, 0xB0, 1, 10];
        assert!(bytes.windows(first.len()).any(|w| w == first));
    }

    #[test]
    fn regressed_timestamp_gets_zero_delta() {
        let mut cap = SessionCapture::new("");
        cap.record(Duration::from_secs(2), &[0xB0, 1, 10]);
        cap.record(Duration::from_secs(1), &[0xB0, 1, 11]);
        let bytes = cap.to_bytes();
        let second = [0x00, 0xB0, 1, 11];
        assert!(bytes.windows(second.len()).any(|w| w == second));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.mid");
        let mut cap = SessionCapture::default();
        cap.record(Duration::ZERO, &[0xB0, 7, 100]);
        cap.write_file(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), cap.to_bytes());
    }
}
