mod delay;
mod lowpass;
mod shaper;

pub use delay::Delay;
pub use lowpass::LowPass;
pub use shaper::Shaper;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EFFECT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_effect_id() -> u64 {
    NEXT_EFFECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// One entry in the effect chain. A closed enum rather than `Box<dyn
/// Trait>` (see the design doc's open-question resolution): the set of
/// effect kinds is fixed and small, so static dispatch avoids an
/// allocation per effect and keeps the chain `Clone`, which the
/// control-side mirror relies on to ship snapshots down the command
/// channel.
#[derive(Clone)]
pub enum Effect {
    LowPass(LowPass),
    Delay(Delay),
    Shaper(Shaper),
}

impl Effect {
    pub fn id(&self) -> u64 {
        match self {
            Effect::LowPass(e) => e.id(),
            Effect::Delay(e) => e.id(),
            Effect::Shaper(e) => e.id(),
        }
    }

    /// The canonical name used by `update_effect_parameters`/`configure`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Effect::LowPass(_) => "lowpass",
            Effect::Delay(_) => "delay",
            Effect::Shaper(_) => "octave",
        }
    }

    pub fn process(&mut self, frame: (f32, f32)) -> (f32, f32) {
        match self {
            Effect::LowPass(e) => e.process(frame),
            Effect::Delay(e) => e.process(frame),
            Effect::Shaper(e) => e.process(frame),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Effect::LowPass(e) => e.reset(),
            Effect::Delay(e) => e.reset(),
            Effect::Shaper(e) => e.reset(),
        }
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        match self {
            Effect::LowPass(e) => e.set_sample_rate(sr),
            Effect::Delay(e) => e.set_sample_rate(sr),
            Effect::Shaper(e) => e.set_sample_rate(sr),
        }
    }
}

/// Maps a free-form effect name (from MIDI/config) onto one of the
/// canonical kind names, accepting a couple of synonyms.
pub(crate) fn canonical_effect_name(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "lowpass" | "lpf" | "filter" => Some("lowpass"),
        "delay" | "echo" => Some("delay"),
        "octave" => Some("octave"),
        _ => None,
    }
}
