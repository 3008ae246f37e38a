#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Single-voice ADSR amplitude envelope.
///
/// Attack ramps linearly from the current level to `1.0` at rate
/// `1 / attack_s`. Decay ramps from `1.0` toward `sustain_level` at rate
/// `(1 - sustain_level) / decay_s`. Release ramps linearly from whatever
/// level it started at toward `0.0` at rate `level_at_release / release_s`,
/// so release always takes `release_s` seconds regardless of when it
/// began. A rising edge of `note_on` always moves to `Attack` from the
/// current level, including resuming from mid-release.
#[derive(Clone, Debug)]
pub struct Envelope {
    attack_s: f32,
    decay_s: f32,
    sustain_level: f32,
    release_s: f32,
    stage: Stage,
    level: f32,
    prev_note_on: bool,
    release_start_level: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            attack_s: 0.1,
            decay_s: 0.2,
            sustain_level: 0.7,
            release_s: 0.3,
            stage: Stage::Idle,
            level: 0.0,
            prev_note_on: false,
            release_start_level: 0.0,
        }
    }

    /// Clamps and stores new ADSR timings; takes effect on the next
    /// `process` call, mid-stage if already running.
    pub fn set_params(&mut self, attack_s: f32, decay_s: f32, sustain_level: f32, release_s: f32) {
        self.attack_s = attack_s.max(0.0);
        self.decay_s = decay_s.max(0.0);
        self.sustain_level = sustain_level.clamp(0.0, 1.0);
        self.release_s = release_s.max(0.0);
    }

    /// Forces the envelope back to `Idle` at level `0.0`. Used when a note
    /// is triggered from silence (no notes were previously active).
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.level = 0.0;
        self.prev_note_on = false;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Advances the envelope by one sample given the current gate state.
    pub fn process(&mut self, note_on: bool, sample_rate: f32) -> f32 {
        let dt = 1.0 / sample_rate.max(1.0);
        let rising_edge = note_on && !self.prev_note_on;
        self.prev_note_on = note_on;

        if rising_edge {
            self.stage = Stage::Attack;
        }

        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                let rate = if self.attack_s > 1e-6 { 1.0 / self.attack_s } else { f32::INFINITY };
                self.level += rate * dt;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
                if !note_on {
                    self.release_start_level = self.level;
                    self.stage = Stage::Release;
                }
            }
            Stage::Decay => {
                if !note_on {
                    self.release_start_level = self.level;
                    self.stage = Stage::Release;
                } else {
                    let span = (1.0 - self.sustain_level).max(0.0);
                    let rate = if self.decay_s > 1e-6 { span / self.decay_s } else { f32::INFINITY };
                    self.level -= rate * dt;
                    if self.level <= self.sustain_level {
                        self.level = self.sustain_level;
                        self.stage = Stage::Sustain;
                    }
                }
            }
            Stage::Sustain => {
                if !note_on {
                    self.release_start_level = self.level;
                    self.stage = Stage::Release;
                } else if (self.level - self.sustain_level).abs() > 1e-6 {
                    // sustain level moved while holding; retarget at the
                    // decay rate rather than snapping.
                    let diff = (self.level - self.sustain_level).abs();
                    let rate = if self.decay_s > 1e-6 { diff / self.decay_s } else { f32::INFINITY };
                    if self.level > self.sustain_level {
                        self.level = (self.level - rate * dt).max(self.sustain_level);
                    } else {
                        self.level = (self.level + rate * dt).min(self.sustain_level);
                    }
                }
            }
            Stage::Release => {
                if note_on {
                    self.stage = Stage::Attack;
                } else {
                    let rate = if self.release_s > 1e-6 && self.release_start_level > 1e-6 {
                        self.release_start_level / self.release_s
                    } else {
                        f32::INFINITY
                    };
                    self.level -= rate * dt;
                    if self.level <= 0.0 {
                        self.level = 0.0;
                        self.stage = Stage::Idle;
                    }
                }
            }
        }

        self.level = self.level.clamp(0.0, 1.0);
        self.level
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}
