use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

/// `f32` bit-cast into an `AtomicU32`. Every load/store uses relaxed
/// ordering: scalar parameters are torn-read-tolerant by design (see the
/// concurrency section of the design doc), so there's never a
/// happens-before relationship to establish here. Grounded on
/// `other_examples/c89971a9_Milkshiift-Isochronator`'s `SyncState`.
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed)
    }
}

/// All engine state that crosses from the control/MIDI threads to the
/// audio thread without going through the command channel: plain scalar
/// parameters (atomics, torn reads tolerated) plus a pair of one-shot
/// dirty flags the audio thread consumes at the top of `next_sample`.
///
/// Defaults match the documented Engine lifecycle: square wave,
/// Attack=0.1/Decay=0.2/Sustain=0.7/Release=0.3, drift rate=0.35 Hz,
/// amount=4¢, jitter=3¢, secondary oscillator disabled.
pub(crate) struct Shared {
    pub pitch_bend_cents: AtomicF32,
    pub drift_rate_hz: AtomicF32,
    pub drift_amount_cents: AtomicF32,
    pub drift_jitter_cents: AtomicF32,

    pub secondary_enabled: AtomicBool,
    pub secondary_mix: AtomicF32,
    pub secondary_detune_cents: AtomicF32,
    pub secondary_octave_offset: AtomicI32,

    pub primary_waveform: AtomicU8,
    pub secondary_waveform: AtomicU8,

    pub attack_s: AtomicF32,
    pub decay_s: AtomicF32,
    pub sustain_level: AtomicF32,
    pub release_s: AtomicF32,

    pub note_on: AtomicBool,
    pub current_frequency_hz: AtomicF32,
    pub current_note_detune_cents: AtomicF32,

    /// Set by `EngineHandle::trigger_note` on the silence-to-first-note
    /// transition; consumed (swapped false) by `Engine` to reset
    /// oscillator phases, the drift LFO's phase, and the envelope.
    pub pending_reset: AtomicBool,
    pub pending_reset_lfo_phase: AtomicF32,

    /// Set by `EngineHandle::reset_effects`; consumed by `Engine` to
    /// reset every effect's internal state without touching membership.
    pub pending_effects_reset: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        const SQUARE_TAG: u8 = 1;
        Self {
            pitch_bend_cents: AtomicF32::new(0.0),
            drift_rate_hz: AtomicF32::new(0.35),
            drift_amount_cents: AtomicF32::new(4.0),
            drift_jitter_cents: AtomicF32::new(3.0),

            secondary_enabled: AtomicBool::new(false),
            secondary_mix: AtomicF32::new(0.0),
            secondary_detune_cents: AtomicF32::new(0.0),
            secondary_octave_offset: AtomicI32::new(0),

            primary_waveform: AtomicU8::new(SQUARE_TAG),
            secondary_waveform: AtomicU8::new(SQUARE_TAG),

            attack_s: AtomicF32::new(0.1),
            decay_s: AtomicF32::new(0.2),
            sustain_level: AtomicF32::new(0.7),
            release_s: AtomicF32::new(0.3),

            note_on: AtomicBool::new(false),
            current_frequency_hz: AtomicF32::new(0.0),
            current_note_detune_cents: AtomicF32::new(0.0),

            pending_reset: AtomicBool::new(false),
            pending_reset_lfo_phase: AtomicF32::new(0.0),

            pending_effects_reset: AtomicBool::new(false),
        }
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_f32_roundtrips() {
        let a = AtomicF32::new(1.5);
        assert_eq!(a.load(), 1.5);
        a.store(-2.25);
        assert_eq!(a.load(), -2.25);
    }

    #[test]
    fn shared_defaults_match_documented_lifecycle() {
        let shared = Shared::new();
        assert_eq!(shared.primary_waveform.load(Ordering::Relaxed), 1);
        assert_eq!(shared.secondary_waveform.load(Ordering::Relaxed), 1);
        assert_eq!(shared.attack_s.load(), 0.1);
        assert_eq!(shared.decay_s.load(), 0.2);
        assert_eq!(shared.sustain_level.load(), 0.7);
        assert_eq!(shared.release_s.load(), 0.3);
        assert_eq!(shared.drift_rate_hz.load(), 0.35);
        assert_eq!(shared.drift_amount_cents.load(), 4.0);
        assert_eq!(shared.drift_jitter_cents.load(), 3.0);
        assert!(!shared.secondary_enabled.load(Ordering::Relaxed));
        assert!(!shared.note_on.load(Ordering::Relaxed));
    }
}
