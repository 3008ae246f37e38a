pub mod audio;
pub(crate) mod command;
pub mod core;
pub mod dsp;
pub mod envelope;
pub mod handle;
pub mod midi;
pub(crate) mod params;
pub mod ring_buffer;
pub(crate) mod voice;
pub mod waveform;

pub use audio::AudioDeviceBinding;
pub use core::Engine;
pub use handle::{ActiveNote, EngineHandle};
pub use midi::{MidiEvent, MidiTranslator};
pub use ring_buffer::RingBuffer;
pub use waveform::Waveform;

use std::sync::Arc;

use params::Shared;

/// Constructs a new `Engine`/`EngineHandle` pair at a fixed sample rate
/// (clamped to a sane minimum of 100 Hz). The `Engine` half belongs on
/// whichever thread will call `next_sample`; the `EngineHandle` half can
/// be cloned freely across control/MIDI threads.
pub fn new_engine(sample_rate: f32) -> (Engine, EngineHandle) {
    let shared = Arc::new(Shared::new());
    let (tx, rx) = crossbeam_channel::unbounded();
    let engine = Engine::new(sample_rate, Arc::clone(&shared), rx);
    let handle = EngineHandle::new(shared, tx, engine.sample_rate());
    (engine, handle)
}
