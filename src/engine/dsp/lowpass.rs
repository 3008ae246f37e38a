use std::sync::Arc;

use crate::engine::params::AtomicF32;

use super::next_effect_id;

fn max_cutoff(sample_rate: f32) -> f32 {
    0.45 * (sample_rate / 2.0)
}

fn clamp_cutoff(hz: f32, sample_rate: f32) -> f32 {
    let max = max_cutoff(sample_rate).max(20.0);
    hz.clamp(20.0, max)
}

struct LowPassParams {
    cutoff_hz: AtomicF32,
    q: AtomicF32,
    mix: AtomicF32,
}

/// RBJ-cookbook resonant low-pass, Direct-Form-II-Transposed, one instance
/// per stereo channel's state. Cutoffs below 20 Hz collapse to a
/// pass-through (identity coefficients) rather than risk unstable/NaN
/// coefficients.
#[derive(Clone)]
pub struct LowPass {
    id: u64,
    params: Arc<LowPassParams>,
    sample_rate: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: [f32; 2],
    z2: [f32; 2],
    last_cutoff: f32,
    last_q: f32,
}

impl LowPass {
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(100.0);
        let params = Arc::new(LowPassParams {
            cutoff_hz: AtomicF32::new(clamp_cutoff(20_000.0, sample_rate)),
            q: AtomicF32::new(1.0),
            mix: AtomicF32::new(1.0),
        });
        let mut lp = Self {
            id: next_effect_id(),
            params,
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: [0.0; 2],
            z2: [0.0; 2],
            last_cutoff: -1.0,
            last_q: -1.0,
        };
        lp.recompute();
        lp
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_cutoff(&self, hz: f32) {
        self.params.cutoff_hz.store(clamp_cutoff(hz, self.sample_rate));
    }

    pub fn cutoff(&self) -> f32 {
        self.params.cutoff_hz.load()
    }

    pub fn set_resonance(&self, q: f32) {
        self.params.q.store(q.clamp(0.1, 10.0));
    }

    pub fn set_mix(&self, mix: f32) {
        self.params.mix.store(mix.clamp(0.0, 1.0));
    }

    fn recompute(&mut self) {
        let cutoff = self.params.cutoff_hz.load();
        let q = self.params.q.load();
        if (cutoff - self.last_cutoff).abs() < 1e-6 && (q - self.last_q).abs() < 1e-6 {
            return;
        }
        self.last_cutoff = cutoff;
        self.last_q = q;

        if cutoff <= 20.0 + 1e-3 {
            self.b0 = 1.0;
            self.b1 = 0.0;
            self.b2 = 0.0;
            self.a1 = 0.0;
            self.a2 = 0.0;
            return;
        }

        let omega = std::f32::consts::TAU * cutoff / self.sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * q.max(0.1));
        let a0 = 1.0 + alpha;
        let b0 = (1.0 - cos_w) / 2.0;
        let b1 = 1.0 - cos_w;
        let b2 = b0;
        let a1 = -2.0 * cos_w;
        let a2 = 1.0 - alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;

        if ![self.b0, self.b1, self.b2, self.a1, self.a2].iter().all(|v| v.is_finite()) {
            self.b0 = 1.0;
            self.b1 = 0.0;
            self.b2 = 0.0;
            self.a1 = 0.0;
            self.a2 = 0.0;
        }
    }

    pub fn process(&mut self, frame: (f32, f32)) -> (f32, f32) {
        self.recompute();
        let mix = self.params.mix.load().clamp(0.0, 1.0);
        let l = self.process_channel(0, frame.0);
        let r = self.process_channel(1, frame.1);
        ((1.0 - mix) * frame.0 + mix * l, (1.0 - mix) * frame.1 + mix * r)
    }

    fn process_channel(&mut self, ch: usize, x: f32) -> f32 {
        let y = self.b0 * x + self.z1[ch];
        self.z1[ch] = self.b1 * x + self.z2[ch] - self.a1 * y;
        self.z2[ch] = self.b2 * x - self.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = [0.0; 2];
        self.z2 = [0.0; 2];
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        self.sample_rate = sr.max(100.0);
        self.last_cutoff = -1.0;
        let clamped = clamp_cutoff(self.params.cutoff_hz.load(), self.sample_rate);
        self.params.cutoff_hz.store(clamped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_passes_through_at_unity_mix() {
        let mut lp = LowPass::new(44_100.0);
        lp.set_cutoff(1_000.0);
        lp.set_mix(1.0);
        let mut last = 0.0;
        for _ in 0..2000 {
            last = lp.process((1.0, 1.0)).0;
        }
        assert!((last - 1.0).abs() < 0.01, "expected DC settle near 1.0, got {last}");
    }

    #[test]
    fn zero_mix_is_bypass() {
        let mut lp = LowPass::new(44_100.0);
        lp.set_cutoff(200.0);
        lp.set_mix(0.0);
        for i in 0..64 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let (l, r) = lp.process((x, -x));
            assert_eq!(l, x);
            assert_eq!(r, -x);
        }
    }

    #[test]
    fn collapses_to_pass_through_at_minimum_cutoff() {
        let mut lp = LowPass::new(44_100.0);
        lp.set_cutoff(1.0); // clamps to 20 Hz floor -> pass-through branch
        lp.set_mix(1.0);
        let (l, _) = lp.process((0.5, -0.5));
        assert!((l - 0.5).abs() < 1e-4);
    }

    #[test]
    fn cutoff_reads_back_clamped() {
        let lp = LowPass::new(44_100.0);
        lp.set_cutoff(50_000.0);
        assert!(lp.cutoff() <= max_cutoff(44_100.0) + 1e-3);
        lp.set_cutoff(-10.0);
        assert_eq!(lp.cutoff(), 20.0);
    }
}
