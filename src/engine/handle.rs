use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;

use super::command::EngineCommand;
use super::dsp::{canonical_effect_name, Delay, Effect, LowPass, Shaper};
use super::params::Shared;
use super::waveform::Waveform;

/// One held note: the frequency it sounds at, and the per-note random
/// detune it was dealt at trigger time.
#[derive(Clone, Copy, Debug)]
pub struct ActiveNote {
    pub frequency_hz: f32,
    pub detune_cents: f32,
}

struct HandleInner {
    shared: Arc<Shared>,
    tx: Sender<EngineCommand>,
    sample_rate: f32,
    active_notes: Mutex<Vec<ActiveNote>>,
    /// Control-side mirror of the audio-owned effect chain: same
    /// instances (same ids, same `Arc`-wrapped per-effect params), kept
    /// structurally in sync by always pushing a fresh clone down `tx`
    /// whenever membership changes. Scalar tweaks (cutoff, feedback, ...)
    /// go straight through the shared `Arc` params and need no resend.
    effects: Mutex<Vec<Effect>>,
    last_cutoff: Mutex<f32>,
    rng: Mutex<StdRng>,
    last_config: Mutex<Option<EngineConfig>>,
}

/// The control/MIDI-thread-facing half of an `Engine`.
///
/// Cheap to clone; every clone shares the same underlying state. Safe to
/// call from any number of non-audio threads — note bookkeeping and the
/// effect-chain mirror are serialized behind `Mutex`es the audio thread
/// never touches, and everything the audio thread *does* touch crosses
/// over via atomics or the bounded command channel.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<HandleInner>,
}

impl EngineHandle {
    pub(crate) fn new(shared: Arc<Shared>, tx: Sender<EngineCommand>, sample_rate: f32) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                shared,
                tx,
                sample_rate,
                active_notes: Mutex::new(Vec::new()),
                effects: Mutex::new(Vec::new()),
                last_cutoff: Mutex::new(0.0),
                rng: Mutex::new(StdRng::from_entropy()),
                last_config: Mutex::new(None),
            }),
        }
    }

    fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    fn push_chain_snapshot(&self, effects: &[Effect]) {
        let _ = self.inner.tx.send(EngineCommand::SetEffectChain(effects.to_vec()));
    }

    // -- note triggers --------------------------------------------------

    /// Triggers a note at `frequency_hz` (must be in `(0, 20000]`, else
    /// ignored). If no note was previously held, resets oscillator phases,
    /// randomizes the drift LFO's phase, and resets the envelope — all on
    /// the audio thread's next `next_sample` call. A per-note detune is
    /// drawn uniformly from `[-jitter_cents, +jitter_cents]` here, on the
    /// control thread, per the engine's "RNG never touches the audio
    /// thread" rule.
    pub fn trigger_note(&self, frequency_hz: f32) {
        if !(frequency_hz > 0.0) || frequency_hz > 20_000.0 {
            return;
        }

        let jitter = self.shared().drift_jitter_cents.load();
        let (detune_cents, initial_phase) = {
            let mut rng = self.inner.rng.lock().unwrap();
            let detune_cents = if jitter > 0.0 { rng.gen_range(-jitter..=jitter) } else { 0.0 };
            let initial_phase: f32 = rng.gen();
            (detune_cents, initial_phase)
        };

        let was_empty = {
            let mut notes = self.inner.active_notes.lock().unwrap();
            let was_empty = notes.is_empty();
            notes.push(ActiveNote { frequency_hz, detune_cents });
            was_empty
        };

        self.shared().current_frequency_hz.store(frequency_hz);
        self.shared().current_note_detune_cents.store(detune_cents);
        self.shared().note_on.store(true, Ordering::Relaxed);

        if was_empty {
            self.shared().pending_reset_lfo_phase.store(initial_phase);
            self.shared().pending_reset.store(true, Ordering::Release);
        }
    }

    /// Releases the most recently triggered note matching `frequency_hz`
    /// (within `1e-3` Hz), or every held note if `None`. If other notes
    /// remain held, the most recently triggered of those becomes the
    /// currently sounding pitch (monophonic last-note priority).
    pub fn trigger_note_off(&self, frequency_hz: Option<f32>) {
        let mut notes = self.inner.active_notes.lock().unwrap();
        match frequency_hz {
            Some(f) => {
                if let Some(pos) = notes.iter().rposition(|n| (n.frequency_hz - f).abs() < 1e-3) {
                    notes.remove(pos);
                }
            }
            None => notes.clear(),
        }

        match notes.last() {
            Some(last) => {
                self.shared().current_frequency_hz.store(last.frequency_hz);
                self.shared().current_note_detune_cents.store(last.detune_cents);
                self.shared().note_on.store(true, Ordering::Relaxed);
            }
            None => {
                self.shared().note_on.store(false, Ordering::Relaxed);
            }
        }
    }

    pub fn active_note_count(&self) -> usize {
        self.inner.active_notes.lock().unwrap().len()
    }

    // -- oscillator / envelope parameters -------------------------------

    /// Sets both the primary and secondary oscillator waveform.
    pub fn set_waveform(&self, name: &str) {
        let wave = Waveform::from_name(name).unwrap_or_default();
        self.shared().primary_waveform.store(wave.to_tag(), Ordering::Relaxed);
        self.shared().secondary_waveform.store(wave.to_tag(), Ordering::Relaxed);
    }

    pub fn set_secondary_waveform(&self, name: &str) {
        let wave = Waveform::from_name(name).unwrap_or_default();
        self.shared().secondary_waveform.store(wave.to_tag(), Ordering::Relaxed);
    }

    /// Normalizes `mix`∈[0,1], `detune_cents`≥0, `octave_offset`∈[-2,2].
    /// When `enabled` is false, the secondary oscillator's mix is forced
    /// to zero so it contributes nothing regardless of the other fields.
    pub fn configure_secondary(&self, enabled: bool, mix: f32, detune_cents: f32, octave_offset: i32) {
        let mix = if enabled { mix.clamp(0.0, 1.0) } else { 0.0 };
        let detune_cents = detune_cents.max(0.0);
        let octave_offset = octave_offset.clamp(-2, 2);
        self.shared().secondary_enabled.store(enabled, Ordering::Relaxed);
        self.shared().secondary_mix.store(mix);
        self.shared().secondary_detune_cents.store(detune_cents);
        self.shared().secondary_octave_offset.store(octave_offset, Ordering::Relaxed);
    }

    /// 14-bit MIDI-style pitch bend, `raw`∈[-8192,8191], mapped to
    /// ±100 cents.
    pub fn set_pitch_bend(&self, raw: i32) {
        let raw = raw.clamp(-8192, 8191);
        let normalized = if raw >= 0 { raw as f32 / 8191.0 } else { raw as f32 / 8192.0 };
        self.shared().pitch_bend_cents.store((normalized * 100.0).clamp(-100.0, 100.0));
    }

    pub fn update_adsr(&self, attack_s: f32, decay_s: f32, sustain_level: f32, release_s: f32) {
        self.shared().attack_s.store(attack_s.max(0.0));
        self.shared().decay_s.store(decay_s.max(0.0));
        self.shared().sustain_level.store(sustain_level.clamp(0.0, 1.0));
        self.shared().release_s.store(release_s.max(0.0));
    }

    pub fn set_drift(&self, rate_hz: f32, amount_cents: f32, jitter_cents: f32) {
        self.shared().drift_rate_hz.store(rate_hz.max(0.0));
        self.shared().drift_amount_cents.store(amount_cents.max(0.0));
        self.shared().drift_jitter_cents.store(jitter_cents.max(0.0));
    }

    // -- effect chain -----------------------------------------------------

    /// Appends `effect` unless an effect with the same identity (the same
    /// constructed instance, possibly already `.clone()`d) is already
    /// present. Adding a low-pass re-applies the last cutoff that was
    /// ever requested via `set_low_pass_cutoff`, if any.
    pub fn add_effect(&self, effect: Effect) {
        let mut effects = self.inner.effects.lock().unwrap();
        if effects.iter().any(|e| e.id() == effect.id()) {
            return;
        }
        if let Effect::LowPass(lp) = &effect {
            let last_cutoff = *self.inner.last_cutoff.lock().unwrap();
            if last_cutoff > 0.0 {
                lp.set_cutoff(last_cutoff);
            } else {
                *self.inner.last_cutoff.lock().unwrap() = lp.cutoff();
            }
        }
        effects.push(effect);
        self.push_chain_snapshot(&effects);
    }

    /// Resets every effect then empties the chain.
    pub fn clear_effects(&self) {
        let mut effects = self.inner.effects.lock().unwrap();
        for e in effects.iter_mut() {
            e.reset();
        }
        effects.clear();
        *self.inner.last_cutoff.lock().unwrap() = 0.0;
        self.push_chain_snapshot(&effects);
    }

    /// Resets internal DSP state (filter memory, delay buffers, shaper
    /// state) without changing chain membership.
    pub fn reset_effects(&self) {
        let mut effects = self.inner.effects.lock().unwrap();
        for e in effects.iter_mut() {
            e.reset();
        }
        self.shared().pending_effects_reset.store(true, Ordering::Release);
    }

    /// Applies `hz` to every low-pass currently in the chain and records
    /// it as the last requested cutoff (so it can be re-applied if a
    /// low-pass is added later, and so `get_low_pass_cutoff` reflects it
    /// even before any low-pass exists).
    pub fn set_low_pass_cutoff(&self, hz: f32) {
        let hz = hz.max(0.0);
        let mut effects = self.inner.effects.lock().unwrap();
        for e in effects.iter_mut() {
            if let Effect::LowPass(lp) = e {
                lp.set_cutoff(hz);
            }
        }
        *self.inner.last_cutoff.lock().unwrap() = hz;
    }

    pub fn get_low_pass_cutoff(&self) -> f32 {
        *self.inner.last_cutoff.lock().unwrap()
    }

    /// Finds the first effect in the chain matching `name` (case
    /// insensitive, synonyms accepted) and applies each recognized
    /// `(key, value)` pair to it. Returns `false` if no matching effect
    /// was found.
    pub fn update_effect_parameters(&self, name: &str, params: &[(&str, f32)]) -> bool {
        let Some(key) = canonical_effect_name(name) else {
            return false;
        };
        let effects = self.inner.effects.lock().unwrap();
        let Some(effect) = effects.iter().find(|e| e.kind_name() == key) else {
            return false;
        };
        match effect {
            Effect::LowPass(lp) => {
                for (k, v) in params {
                    match *k {
                        "cutoff" | "cutoff_hz" => lp.set_cutoff(*v),
                        "resonance" | "q" => lp.set_resonance(*v),
                        "mix" => lp.set_mix(*v),
                        _ => {}
                    }
                }
            }
            Effect::Delay(d) => {
                for (k, v) in params {
                    match *k {
                        "time" | "delay_time" | "delay_time_s" => d.set_delay_time(*v),
                        "feedback" => d.set_feedback(*v),
                        "mix" => d.set_mix(*v),
                        _ => {}
                    }
                }
            }
            Effect::Shaper(s) => {
                for (k, v) in params {
                    match *k {
                        "blend" => s.set_blend(*v),
                        "higher" => s.set_higher(*v != 0.0),
                        _ => {}
                    }
                }
            }
        }
        true
    }

    // -- configuration ----------------------------------------------------

    /// Applies a full configuration record: waveform, ADSR, and effect
    /// chain (rebuilt from scratch from `cfg.effects`). Unknown effect
    /// names are logged and skipped. `cfg.sample_rate`, if it disagrees
    /// with the engine's fixed construction-time sample rate, is logged
    /// and otherwise ignored.
    pub fn configure(&self, cfg: &EngineConfig) {
        self.set_waveform(&cfg.waveform_name);
        self.update_adsr(cfg.attack, cfg.decay, cfg.sustain, cfg.release);

        let sample_rate = self.inner.sample_rate;
        {
            let mut effects = self.inner.effects.lock().unwrap();
            for e in effects.iter_mut() {
                e.reset();
            }
            effects.clear();
            *self.inner.last_cutoff.lock().unwrap() = 0.0;

            for name in &cfg.effects {
                match canonical_effect_name(name) {
                    Some("lowpass") => {
                        let lp = LowPass::new(sample_rate);
                        *self.inner.last_cutoff.lock().unwrap() = lp.cutoff();
                        effects.push(Effect::LowPass(lp));
                    }
                    Some("delay") => effects.push(Effect::Delay(Delay::new(sample_rate, 2.5))),
                    Some("octave") => effects.push(Effect::Shaper(Shaper::new())),
                    _ => {
                        log::debug!("configure: unknown effect name {name:?}, ignoring");
                    }
                }
            }
            self.push_chain_snapshot(&effects);
        }

        if (cfg.sample_rate - sample_rate).abs() > 0.5 {
            log::warn!(
                "configure: requested sample_rate {} Hz does not match the engine's fixed sample_rate {} Hz; ignoring",
                cfg.sample_rate,
                sample_rate
            );
        }

        *self.inner.last_config.lock().unwrap() = Some(cfg.clone());
    }

    /// Returns the last `EngineConfig` passed to `configure`, unmodified —
    /// including fields the core engine never acts on.
    pub fn config_echo(&self) -> Option<EngineConfig> {
        self.inner.last_config.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::new_engine;

    #[test]
    fn trigger_note_off_by_frequency_falls_back_to_previous_note() {
        let (_engine, handle) = new_engine(44_100.0);
        handle.trigger_note(440.0);
        handle.trigger_note(550.0);
        assert_eq!(handle.active_note_count(), 2);
        handle.trigger_note_off(Some(550.0));
        assert_eq!(handle.active_note_count(), 1);
    }

    #[test]
    fn trigger_note_off_without_frequency_clears_all() {
        let (_engine, handle) = new_engine(44_100.0);
        handle.trigger_note(440.0);
        handle.trigger_note(660.0);
        handle.trigger_note_off(None);
        assert_eq!(handle.active_note_count(), 0);
    }

    #[test]
    fn out_of_range_trigger_is_ignored() {
        let (_engine, handle) = new_engine(44_100.0);
        handle.trigger_note(-10.0);
        handle.trigger_note(30_000.0);
        assert_eq!(handle.active_note_count(), 0);
    }

    #[test]
    fn pitch_bend_extremes_map_to_plus_minus_100_cents() {
        let (_engine, handle) = new_engine(44_100.0);
        handle.set_pitch_bend(8191);
        assert!((handle.shared().pitch_bend_cents.load() - 100.0).abs() < 1e-3);
        handle.set_pitch_bend(-8192);
        assert!((handle.shared().pitch_bend_cents.load() + 100.0).abs() < 1e-3);
    }

    #[test]
    fn disabling_secondary_zeroes_its_mix() {
        let (_engine, handle) = new_engine(44_100.0);
        handle.configure_secondary(false, 0.9, 7.0, 1);
        assert_eq!(handle.shared().secondary_mix.load(), 0.0);
    }

    #[test]
    fn add_effect_ignores_duplicate_identity() {
        let (_engine, handle) = new_engine(44_100.0);
        let lp = LowPass::new(44_100.0);
        handle.add_effect(Effect::LowPass(lp.clone()));
        handle.add_effect(Effect::LowPass(lp));
        assert_eq!(handle.inner.effects.lock().unwrap().len(), 1);
    }

    #[test]
    fn set_low_pass_cutoff_tracks_last_value_even_without_a_filter() {
        let (_engine, handle) = new_engine(44_100.0);
        assert_eq!(handle.get_low_pass_cutoff(), 0.0);
        handle.set_low_pass_cutoff(80.0);
        assert!((handle.get_low_pass_cutoff() - 80.0).abs() < 1e-3);
        handle.set_low_pass_cutoff(12_000.0);
        assert!((handle.get_low_pass_cutoff() - 12_000.0).abs() < 1e-3);
    }

    #[test]
    fn clear_effects_resets_low_pass_bookkeeping() {
        let (_engine, handle) = new_engine(44_100.0);
        handle.add_effect(Effect::LowPass(LowPass::new(44_100.0)));
        handle.set_low_pass_cutoff(500.0);
        handle.clear_effects();
        assert_eq!(handle.get_low_pass_cutoff(), 0.0);
    }
}
