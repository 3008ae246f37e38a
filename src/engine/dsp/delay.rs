use std::sync::Arc;

use crate::engine::params::AtomicF32;

use super::next_effect_id;

fn buffer_len(sample_rate: f32, max_delay_seconds: f32) -> usize {
    ((max_delay_seconds * sample_rate).ceil() as usize + 1).max(2)
}

struct DelayParams {
    delay_time_s: AtomicF32,
    feedback: AtomicF32,
    mix: AtomicF32,
}

/// Stereo feedback delay line. `delay_time_s` is rounded to the nearest
/// sample (no fractional/interpolated read); the buffer is sized to hold
/// `max_delay_seconds` so retuning `delay_time_s` at runtime never needs a
/// reallocation, only a sample-rate change does.
#[derive(Clone)]
pub struct Delay {
    id: u64,
    params: Arc<DelayParams>,
    sample_rate: f32,
    max_delay_seconds: f32,
    buf_l: Vec<f32>,
    buf_r: Vec<f32>,
    write_index: usize,
    delay_samples: usize,
}

impl Delay {
    pub fn new(sample_rate: f32, max_delay_seconds: f32) -> Self {
        let sample_rate = sample_rate.max(100.0);
        let max_delay_seconds = max_delay_seconds.clamp(0.005, 2.5);
        let len = buffer_len(sample_rate, max_delay_seconds);
        let params = Arc::new(DelayParams {
            delay_time_s: AtomicF32::new(0.25),
            feedback: AtomicF32::new(0.35),
            mix: AtomicF32::new(0.3),
        });
        let mut delay = Self {
            id: next_effect_id(),
            params,
            sample_rate,
            max_delay_seconds,
            buf_l: vec![0.0; len],
            buf_r: vec![0.0; len],
            write_index: 0,
            delay_samples: 1,
        };
        delay.recompute_delay_samples();
        delay
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_delay_time(&self, seconds: f32) {
        self.params.delay_time_s.store(seconds.clamp(0.005, 2.5));
    }

    pub fn set_feedback(&self, feedback: f32) {
        self.params.feedback.store(feedback.clamp(0.0, 0.97));
    }

    pub fn set_mix(&self, mix: f32) {
        self.params.mix.store(mix.clamp(0.0, 1.0));
    }

    fn recompute_delay_samples(&mut self) {
        let len = self.buf_l.len();
        let target = (self.params.delay_time_s.load() * self.sample_rate).round() as i64;
        self.delay_samples = target.clamp(1, (len as i64 - 1).max(1)) as usize;
    }

    pub fn process(&mut self, frame: (f32, f32)) -> (f32, f32) {
        self.recompute_delay_samples();
        let len = self.buf_l.len();
        let d = self.delay_samples;
        let feedback = self.params.feedback.load().clamp(0.0, 0.97);
        let mix = self.params.mix.load().clamp(0.0, 1.0);

        let read_idx = (self.write_index + len - d) % len;
        let delayed_l = self.buf_l[read_idx];
        let delayed_r = self.buf_r[read_idx];

        self.buf_l[self.write_index] = (frame.0 + feedback * delayed_l).clamp(-2.0, 2.0);
        self.buf_r[self.write_index] = (frame.1 + feedback * delayed_r).clamp(-2.0, 2.0);

        let out_l = (1.0 - mix) * frame.0 + mix * delayed_l;
        let out_r = (1.0 - mix) * frame.1 + mix * delayed_r;

        self.write_index = (self.write_index + 1) % len;
        (out_l, out_r)
    }

    pub fn reset(&mut self) {
        self.buf_l.iter_mut().for_each(|x| *x = 0.0);
        self.buf_r.iter_mut().for_each(|x| *x = 0.0);
        self.write_index = 0;
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        self.sample_rate = sr.max(100.0);
        let len = buffer_len(self.sample_rate, self.max_delay_seconds);
        self.buf_l = vec![0.0; len];
        self.buf_r = vec![0.0; len];
        self.write_index = 0;
        self.recompute_delay_samples();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_appears_after_delay_samples() {
        let mut delay = Delay::new(1000.0, 1.0);
        delay.set_delay_time(0.01); // 10 samples
        delay.set_feedback(0.5);
        delay.set_mix(1.0);

        delay.process((1.0, 1.0));
        for _ in 0..8 {
            delay.process((0.0, 0.0));
        }
        let (l, _) = delay.process((0.0, 0.0));
        assert!(l > 0.4, "expected echo near sample 10, got {l}");
    }

    #[test]
    fn feedback_decays_geometrically() {
        let mut delay = Delay::new(1000.0, 1.0);
        delay.set_delay_time(0.005); // 5 samples
        delay.set_feedback(0.6);
        delay.set_mix(1.0);

        delay.process((1.0, 0.0));
        let mut peaks = Vec::new();
        for _ in 0..4 {
            let mut last = 0.0;
            for _ in 0..5 {
                last = delay.process((0.0, 0.0)).0;
            }
            peaks.push(last);
        }
        for pair in peaks.windows(2) {
            if pair[0].abs() > 1e-6 {
                assert!(pair[1].abs() <= pair[0].abs() + 1e-6);
            }
        }
        assert!(peaks.last().unwrap().abs() < peaks[0].abs());
    }

    #[test]
    fn reset_clears_tail() {
        let mut delay = Delay::new(1000.0, 1.0);
        delay.set_delay_time(0.01);
        delay.set_feedback(0.8);
        delay.set_mix(1.0);
        delay.process((1.0, 1.0));
        delay.reset();
        let (l, r) = delay.process((0.0, 0.0));
        assert_eq!(l, 0.0);
        assert_eq!(r, 0.0);
    }
}
