use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};

use super::command::EngineCommand;
use super::dsp::Effect;
use super::envelope::Envelope;
use super::params::Shared;
use super::ring_buffer::RingBuffer;
use super::voice::{Voice, VoiceRenderParams};
use super::waveform::Waveform;

/// Defensive cap on structural commands drained per `next_sample` call,
/// mirroring the teacher's own `drained >= 24` guard in its message-pump
/// loop: chain rebuilds are rare, so this never matters in practice, it
/// just bounds worst-case audio-thread work if a control thread somehow
/// floods the channel.
const MAX_COMMANDS_PER_CALL: usize = 8;

/// The audio-callback-owned half of the synthesizer.
///
/// Construct via [`super::new_engine`]. `next_sample` must only ever be
/// called from a single realtime thread; it never blocks and never
/// allocates.
pub struct Engine {
    sample_rate: f32,
    voice: Voice,
    envelope: Envelope,
    effects: Vec<Effect>,
    tap: Option<Arc<RingBuffer>>,
    command_rx: Receiver<EngineCommand>,
    shared: Arc<Shared>,
}

impl Engine {
    pub(crate) fn new(sample_rate: f32, shared: Arc<Shared>, command_rx: Receiver<EngineCommand>) -> Self {
        let sample_rate = sample_rate.max(100.0);
        log::info!("synth engine constructed at {sample_rate} Hz");
        Self {
            sample_rate,
            voice: Voice::new(),
            envelope: Envelope::new(),
            effects: Vec::new(),
            tap: None,
            command_rx,
            shared,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Attaches (or replaces) the lock-free tap a UI/visualizer thread
    /// reads recent samples from.
    pub fn set_tap(&mut self, tap: Arc<RingBuffer>) {
        self.tap = Some(tap);
    }

    fn drain_commands(&mut self) {
        for _ in 0..MAX_COMMANDS_PER_CALL {
            match self.command_rx.try_recv() {
                Ok(EngineCommand::SetEffectChain(mut effects)) => {
                    for e in &mut effects {
                        e.set_sample_rate(self.sample_rate);
                    }
                    self.effects = effects;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply_pending_reset(&mut self) {
        if self.shared.pending_reset.swap(false, Ordering::Acquire) {
            self.voice.reset_phases();
            let phase = self.shared.pending_reset_lfo_phase.load();
            self.voice.set_lfo_phase(phase);
            self.envelope.reset();
        }
        if self.shared.pending_effects_reset.swap(false, Ordering::Acquire) {
            for e in self.effects.iter_mut() {
                e.reset();
            }
        }
    }

    /// Generates the next stereo frame: drains pending structural
    /// commands, applies any pending note-trigger reset, advances the
    /// envelope, renders the voice, runs the effect chain, and (if a tap
    /// is attached) publishes the frame for visualization.
    pub fn next_sample(&mut self) -> (f32, f32) {
        self.drain_commands();
        self.apply_pending_reset();

        self.envelope.set_params(
            self.shared.attack_s.load(),
            self.shared.decay_s.load(),
            self.shared.sustain_level.load(),
            self.shared.release_s.load(),
        );
        let note_on = self.shared.note_on.load(Ordering::Relaxed);
        let envelope_level = self.envelope.process(note_on, self.sample_rate);

        let params = VoiceRenderParams {
            frequency_hz: self.shared.current_frequency_hz.load(),
            note_detune_cents: self.shared.current_note_detune_cents.load(),
            pitch_bend_cents: self.shared.pitch_bend_cents.load(),
            drift_rate_hz: self.shared.drift_rate_hz.load(),
            drift_amount_cents: self.shared.drift_amount_cents.load(),
            primary_waveform: Waveform::from_tag(self.shared.primary_waveform.load(Ordering::Relaxed)),
            secondary_waveform: Waveform::from_tag(self.shared.secondary_waveform.load(Ordering::Relaxed)),
            secondary_enabled: self.shared.secondary_enabled.load(Ordering::Relaxed),
            secondary_mix: self.shared.secondary_mix.load(),
            secondary_detune_cents: self.shared.secondary_detune_cents.load(),
            secondary_octave_offset: self.shared.secondary_octave_offset.load(Ordering::Relaxed),
            envelope_level,
        };
        let mono = self.voice.render(&params, self.sample_rate);

        let mut frame = (mono, mono);
        for effect in self.effects.iter_mut() {
            frame = effect.process(frame);
        }

        if let Some(tap) = &self.tap {
            tap.push(frame.0, frame.1);
        }

        frame
    }
}
