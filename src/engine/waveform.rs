/// One of the four oscillator shapes both the primary and secondary
/// oscillator can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// Case-insensitive name lookup, accepting a couple of common synonyms.
    /// Returns `None` for anything unrecognized so callers can decide the
    /// fallback (most setters default to `Square`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Some(Waveform::Sine),
            "square" | "pulse" => Some(Waveform::Square),
            "saw" | "sawtooth" => Some(Waveform::Saw),
            "triangle" | "tri" => Some(Waveform::Triangle),
            _ => None,
        }
    }

    pub(crate) fn to_tag(self) -> u8 {
        match self {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Saw => 2,
            Waveform::Triangle => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Waveform {
        match tag {
            0 => Waveform::Sine,
            2 => Waveform::Saw,
            3 => Waveform::Triangle,
            _ => Waveform::Square,
        }
    }

    /// Renders one sample at `freq_hz` and advances `phase` by
    /// `freq_hz / sample_rate`, wrapping into `[0, 1)`.
    #[inline]
    pub fn generate(self, freq_hz: f32, sample_rate: f32, phase: &mut f32) -> f32 {
        let p = phase.rem_euclid(1.0);
        let out = match self {
            Waveform::Sine => (std::f32::consts::TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Triangle => 4.0 * (p - 0.5).abs() - 1.0,
        };
        let sr = sample_rate.max(1.0);
        *phase = (p + freq_hz.max(0.0) / sr).rem_euclid(1.0);
        out
    }
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Square
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_recognizes_all_variants() {
        assert_eq!(Waveform::from_name("Sine"), Some(Waveform::Sine));
        assert_eq!(Waveform::from_name("SQUARE"), Some(Waveform::Square));
        assert_eq!(Waveform::from_name("sawtooth"), Some(Waveform::Saw));
        assert_eq!(Waveform::from_name("tri"), Some(Waveform::Triangle));
        assert_eq!(Waveform::from_name("bogus"), None);
    }

    #[test]
    fn generate_stays_in_range_and_advances_phase() {
        for wave in [Waveform::Sine, Waveform::Square, Waveform::Saw, Waveform::Triangle] {
            let mut phase = 0.0f32;
            for _ in 0..1000 {
                let sample = wave.generate(440.0, 44_100.0, &mut phase);
                assert!((-1.0..=1.0).contains(&sample), "{wave:?} out of range: {sample}");
                assert!((0.0..1.0).contains(&phase));
            }
        }
    }

    #[test]
    fn square_wave_has_two_levels() {
        let mut phase = 0.0f32;
        let a = Waveform::Square.generate(0.0, 44_100.0, &mut phase);
        phase = 0.75;
        let b = Waveform::Square.generate(0.0, 44_100.0, &mut phase);
        assert_eq!(a, 1.0);
        assert_eq!(b, -1.0);
    }

    #[test]
    fn tag_roundtrips() {
        for wave in [Waveform::Sine, Waveform::Square, Waveform::Saw, Waveform::Triangle] {
            assert_eq!(Waveform::from_tag(wave.to_tag()), wave);
        }
    }
}
