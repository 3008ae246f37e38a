use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use synthcore::{new_engine, AudioDeviceBinding, RingBuffer};

/// Minimal host: opens the default output device, plays a single note for
/// a few seconds, then exits. Exists so `engine::audio` has something to
/// link against outside of a real UI shell.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let (engine, handle) = new_engine(44_100.0);
    let tap = Arc::new(RingBuffer::new(4096));

    let mut binding = AudioDeviceBinding::new();
    binding
        .start(engine, Some(Arc::clone(&tap)))
        .context("failed to start audio device")?;

    handle.set_waveform("saw");
    handle.update_adsr(0.02, 0.15, 0.6, 0.4);
    handle.trigger_note(220.0);

    thread::sleep(Duration::from_secs(2));
    handle.trigger_note_off(None);
    thread::sleep(Duration::from_millis(500));

    binding.stop();
    Ok(())
}
