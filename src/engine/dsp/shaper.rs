use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::params::AtomicF32;

use super::next_effect_id;

struct ShaperParams {
    higher: AtomicBool,
    blend: AtomicF32,
}

/// The "octave" waveshaper. Not a true pitch shifter (see the design doc's
/// open-question resolution): `higher` applies `tanh`-based soft clipping
/// that emphasizes upper harmonics, `lower` applies a one-pole low-pass
/// that darkens the signal, and `blend` crossfades the shaped signal
/// against the dry input.
#[derive(Clone)]
pub struct Shaper {
    id: u64,
    params: Arc<ShaperParams>,
    lp_state: [f32; 2],
}

impl Shaper {
    pub fn new() -> Self {
        Self {
            id: next_effect_id(),
            params: Arc::new(ShaperParams {
                higher: AtomicBool::new(true),
                blend: AtomicF32::new(0.5),
            }),
            lp_state: [0.0; 2],
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_higher(&self, higher: bool) {
        self.params.higher.store(higher, Ordering::Relaxed);
    }

    pub fn set_blend(&self, blend: f32) {
        self.params.blend.store(blend.clamp(0.0, 1.0));
    }

    pub fn process(&mut self, frame: (f32, f32)) -> (f32, f32) {
        let higher = self.params.higher.load(Ordering::Relaxed);
        let blend = self.params.blend.load().clamp(0.0, 1.0);

        let wet = if higher {
            ((2.0 * frame.0).tanh() * 0.8, (2.0 * frame.1).tanh() * 0.8)
        } else {
            self.lp_state[0] = self.lp_state[0] * 0.8 + frame.0 * 0.2;
            self.lp_state[1] = self.lp_state[1] * 0.8 + frame.1 * 0.2;
            (self.lp_state[0], self.lp_state[1])
        };

        (
            (1.0 - blend) * frame.0 + blend * wet.0,
            (1.0 - blend) * frame.1 + blend * wet.1,
        )
    }

    pub fn reset(&mut self) {
        self.lp_state = [0.0; 2];
    }

    pub fn set_sample_rate(&mut self, _sr: f32) {
        // shaper math is sample-rate independent
    }
}

impl Default for Shaper {
    fn default() -> Self {
        Self::new()
    }
}
