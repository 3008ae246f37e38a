use super::waveform::Waveform;

/// Everything `Voice::render` needs for one sample, read fresh from
/// `Shared` by `Engine::next_sample` every call. Plain data so the voice
/// itself only has to own the oscillator phases it can't recompute from
/// scratch each sample.
pub(crate) struct VoiceRenderParams {
    pub frequency_hz: f32,
    pub note_detune_cents: f32,
    pub pitch_bend_cents: f32,
    pub drift_rate_hz: f32,
    pub drift_amount_cents: f32,
    pub primary_waveform: Waveform,
    pub secondary_waveform: Waveform,
    pub secondary_enabled: bool,
    pub secondary_mix: f32,
    pub secondary_detune_cents: f32,
    pub secondary_octave_offset: i32,
    pub envelope_level: f32,
}

/// The dual-oscillator voice core: owns only what can't be derived fresh
/// each sample (the three running phases). Everything else is read from
/// `VoiceRenderParams` so the audio thread never touches a lock or an
/// allocation to render a frame.
pub(crate) struct Voice {
    primary_phase: f32,
    secondary_phase: f32,
    lfo_phase: f32,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            primary_phase: 0.0,
            secondary_phase: 0.0,
            lfo_phase: 0.0,
        }
    }

    /// Called when a note is triggered from silence.
    pub fn reset_phases(&mut self) {
        self.primary_phase = 0.0;
        self.secondary_phase = 0.0;
    }

    pub fn set_lfo_phase(&mut self, phase: f32) {
        self.lfo_phase = phase.rem_euclid(1.0);
    }

    /// Renders one stereo-summed (mono) sample: drift LFO → cents
    /// composition → dual-oscillator mix → envelope scale.
    pub fn render(&mut self, params: &VoiceRenderParams, sample_rate: f32) -> f32 {
        if params.frequency_hz <= 0.0 || params.envelope_level <= 0.0 {
            return 0.0;
        }

        let lfo_cents = self.advance_lfo(params.drift_rate_hz, sample_rate) * params.drift_amount_cents;
        let total_cents = params.note_detune_cents + lfo_cents + params.pitch_bend_cents;
        let modulated_freq = params.frequency_hz * 2f32.powf(total_cents / 1200.0);

        let primary = params
            .primary_waveform
            .generate(modulated_freq, sample_rate, &mut self.primary_phase);

        let secondary = if params.secondary_enabled && params.secondary_mix > 0.0 {
            let sec_detune = params.secondary_detune_cents.max(0.0);
            let octave_mult = 2f32.powi(params.secondary_octave_offset);
            let secondary_freq = modulated_freq * 2f32.powf(sec_detune / 1200.0) * octave_mult;
            params
                .secondary_waveform
                .generate(secondary_freq, sample_rate, &mut self.secondary_phase)
        } else {
            0.0
        };

        let mix = params.secondary_mix.clamp(0.0, 1.0);
        let sample = primary * (1.0 - mix) + secondary * mix;
        sample * params.envelope_level
    }

    /// Returns the raw (unscaled) `sin(2π·phase)` reading and advances the
    /// LFO's own phase accumulator.
    fn advance_lfo(&mut self, rate_hz: f32, sample_rate: f32) -> f32 {
        let out = (std::f32::consts::TAU * self.lfo_phase).sin();
        let sr = sample_rate.max(1.0);
        self.lfo_phase = (self.lfo_phase + rate_hz.max(0.0) / sr).rem_euclid(1.0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> VoiceRenderParams {
        VoiceRenderParams {
            frequency_hz: 440.0,
            note_detune_cents: 0.0,
            pitch_bend_cents: 0.0,
            drift_rate_hz: 0.0,
            drift_amount_cents: 0.0,
            primary_waveform: Waveform::Sine,
            secondary_waveform: Waveform::Sine,
            secondary_enabled: false,
            secondary_mix: 0.0,
            secondary_detune_cents: 0.0,
            secondary_octave_offset: 0,
            envelope_level: 1.0,
        }
    }

    #[test]
    fn silent_when_envelope_level_is_zero() {
        let mut voice = Voice::new();
        let mut params = default_params();
        params.envelope_level = 0.0;
        for _ in 0..10 {
            assert_eq!(voice.render(&params, 44_100.0), 0.0);
        }
    }

    #[test]
    fn silent_when_frequency_is_zero() {
        let mut voice = Voice::new();
        let mut params = default_params();
        params.frequency_hz = 0.0;
        assert_eq!(voice.render(&params, 44_100.0), 0.0);
    }

    #[test]
    fn disabled_secondary_never_contributes() {
        let mut voice_a = Voice::new();
        let mut voice_b = Voice::new();
        let mut params = default_params();
        params.secondary_enabled = false;
        params.secondary_mix = 1.0; // should be ignored entirely
        params.secondary_waveform = Waveform::Square;

        let mut baseline_params = default_params();
        baseline_params.secondary_mix = 0.0;

        for _ in 0..256 {
            let a = voice_a.render(&params, 44_100.0);
            let b = voice_b.render(&baseline_params, 44_100.0);
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn output_stays_bounded() {
        let mut voice = Voice::new();
        let mut params = default_params();
        params.secondary_enabled = true;
        params.secondary_mix = 0.5;
        params.drift_rate_hz = 2.0;
        params.drift_amount_cents = 50.0;
        for _ in 0..4096 {
            let sample = voice.render(&params, 44_100.0);
            assert!((-1.0..=1.0).contains(&sample));
        }
    }
}
