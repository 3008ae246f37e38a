pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::{new_engine, AudioDeviceBinding, Engine, EngineHandle, MidiEvent, MidiTranslator, RingBuffer, Waveform};
pub use error::EngineError;
