//! Shared helpers for the end-to-end and property tests. Frequency
//! estimation here uses interpolated zero-crossing timing rather than an
//! FFT — accurate enough for the single-tone signals these tests render,
//! and avoids pulling an FFT crate back in for test-only use.

use synthcore::Engine;

/// Pulls `n` stereo frames from `engine`.
pub fn render(engine: &mut Engine, n: usize) -> Vec<(f32, f32)> {
    (0..n).map(|_| engine.next_sample()).collect()
}

/// Estimates the fundamental frequency of `samples` by averaging the
/// spacing between interpolated rising zero-crossings. Assumes a single
/// dominant tone (sine/square/saw/triangle at one pitch).
pub fn estimate_frequency(samples: &[f32], sample_rate: f32) -> f32 {
    let mut crossings = Vec::new();
    for i in 1..samples.len() {
        let (a, b) = (samples[i - 1], samples[i]);
        if a < 0.0 && b >= 0.0 {
            let frac = -a / (b - a);
            crossings.push((i - 1) as f32 + frac);
        }
    }
    if crossings.len() < 2 {
        return 0.0;
    }
    let cycles = (crossings.len() - 1) as f32;
    let span = crossings[crossings.len() - 1] - crossings[0];
    sample_rate / (span / cycles)
}

/// Peak absolute value across `samples`.
pub fn peak_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}
