//! # Pulse Calendar
//!
//! Sigil payloads time-stamp events in pulses (with derived beat and step
//! coordinates) rather than wall-clock time. The protocol core only needs to
//! turn a pulse into a displayable calendar moment for export manifests, so
//! the conversion sits behind the [`PulseCalendar`] trait and hosts may supply
//! their own.
//!
//! [`KaiCalendar`] is the built-in calendar: genesis at
//! `2024-05-10T06:45:41.888Z`, one pulse every `3 + √5` seconds, 36 beats per
//! day, 44 steps per beat, 11 pulses per step.

use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;

/// Unix epoch milliseconds of pulse 0.
pub const GENESIS_EPOCH_MS: i64 = 1_715_323_541_888;

/// Length of one pulse in milliseconds (`(3 + √5) s`).
pub const PULSE_MS: f64 = 5_236.067_977_499_79;

/// Pulses in one calendar day.
pub const PULSES_PER_DAY: f64 = 17_491.270_421;

pub const BEATS_PER_DAY: u32 = 36;
pub const STEPS_PER_BEAT: u32 = 44;
pub const PULSES_PER_STEP: u32 = 11;

/// A pulse resolved to its beat/step coordinates and UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseMoment {
    pub pulse: u64,
    pub beat: u32,
    pub step_index: u32,
    pub utc: Timestamp,
}

/// Pulse ↔ calendar conversion supplied by the host application.
pub trait PulseCalendar: Send + Sync {
    /// The pulse containing the current instant.
    fn now_pulse(&self) -> u64;

    /// Resolve a pulse to its calendar moment.
    fn moment(&self, pulse: u64) -> PulseMoment;
}

/// The built-in pulse calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct KaiCalendar;

impl KaiCalendar {
    /// The pulse containing `ts`. Instants before genesis map to pulse 0.
    pub fn pulse_at(&self, ts: &Timestamp) -> u64 {
        let elapsed = (ts.epoch_millis() - GENESIS_EPOCH_MS) as f64;
        if elapsed <= 0.0 {
            return 0;
        }
        (elapsed / PULSE_MS).floor() as u64
    }

    fn beat_and_step(pulse: u64) -> (u32, u32) {
        let pulses_per_beat = PULSES_PER_DAY / f64::from(BEATS_PER_DAY);
        let in_day = (pulse as f64).rem_euclid(PULSES_PER_DAY);
        let beat = ((in_day / pulses_per_beat).floor() as u32).min(BEATS_PER_DAY - 1);
        let in_beat = in_day - f64::from(beat) * pulses_per_beat;
        let step = ((in_beat / f64::from(PULSES_PER_STEP)).floor() as u32).min(STEPS_PER_BEAT - 1);
        (beat, step)
    }
}

impl PulseCalendar for KaiCalendar {
    fn now_pulse(&self) -> u64 {
        self.pulse_at(&Timestamp::now())
    }

    fn moment(&self, pulse: u64) -> PulseMoment {
        let (beat, step_index) = Self::beat_and_step(pulse);
        let offset_ms = (pulse as f64 * PULSE_MS).ceil() as i64;
        // Pulses past the calendar's range pin to its last instant.
        let utc = Timestamp::from_epoch_millis_saturating(GENESIS_EPOCH_MS.saturating_add(offset_ms));
        PulseMoment {
            pulse,
            beat,
            step_index,
            utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_zero_is_genesis() {
        let m = KaiCalendar.moment(0);
        assert_eq!(m.utc.to_iso8601(), "2024-05-10T06:45:41.888Z");
        assert_eq!((m.beat, m.step_index), (0, 0));
    }

    #[test]
    fn step_advances_every_eleven_pulses() {
        assert_eq!(KaiCalendar.moment(10).step_index, 0);
        assert_eq!(KaiCalendar.moment(11).step_index, 1);
        assert_eq!(KaiCalendar.moment(22).step_index, 2);
    }

    #[test]
    fn beat_advances_after_one_beat_of_pulses() {
        assert_eq!(KaiCalendar.moment(485).beat, 0);
        assert_eq!(KaiCalendar.moment(486).beat, 1);
    }

    #[test]
    fn coordinates_wrap_each_day() {
        let next_day = KaiCalendar.moment(17_492);
        assert_eq!(next_day.beat, 0);
        assert!(next_day.step_index <= 1);
    }

    #[test]
    fn step_index_is_clamped_within_beat() {
        for pulse in 0..2_000 {
            let m = KaiCalendar.moment(pulse);
            assert!(m.step_index < STEPS_PER_BEAT);
            assert!(m.beat < BEATS_PER_DAY);
        }
    }

    #[test]
    fn far_future_pulse_is_clamped_deterministically() {
        let a = KaiCalendar.moment(u64::MAX);
        let b = KaiCalendar.moment(u64::MAX);
        assert_eq!(a, b);
        assert_eq!(a.utc, Timestamp::from_epoch_millis_saturating(i64::MAX));
        assert!(a.utc > KaiCalendar.moment(1_000_000).utc);
    }

    #[test]
    fn pulse_at_inverts_moment() {
        let m = KaiCalendar.moment(1_234_567);
        assert_eq!(KaiCalendar.pulse_at(&m.utc), 1_234_567);
    }

    #[test]
    fn pre_genesis_maps_to_zero() {
        let ts = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
        assert_eq!(KaiCalendar.pulse_at(&ts), 0);
    }

    #[test]
    fn moment_serializes_camel_case() {
        let json = serde_json::to_value(KaiCalendar.moment(11)).unwrap();
        assert_eq!(json["stepIndex"], 1);
        assert!(json["utc"].as_str().unwrap().ends_with('Z'));
    }
}
