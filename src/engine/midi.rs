use once_cell::sync::Lazy;

use super::handle::EngineHandle;

pub const NOTE_ON: u8 = 0x90;
pub const NOTE_OFF: u8 = 0x80;
pub const PITCH_BEND: u8 = 0xE0;
pub const CONTROL_CHANGE: u8 = 0xB0;

/// A single MIDI-style event: a status byte plus two data bytes. Any
/// `kind` other than the constants above is ignored by `MidiTranslator`.
#[derive(Clone, Copy, Debug)]
pub struct MidiEvent {
    pub kind: u8,
    pub data1: u8,
    pub data2: u8,
}

/// 12-tone-equal-temperament note-to-frequency table, A4 (note 69) = 440 Hz.
static NOTE_FREQUENCIES: Lazy<[f32; 128]> = Lazy::new(|| {
    let mut table = [0.0f32; 128];
    for (note, slot) in table.iter_mut().enumerate() {
        *slot = 440.0 * 2f32.powf((note as f32 - 69.0) / 12.0);
    }
    table
});

pub fn note_frequency(note: u8) -> f32 {
    NOTE_FREQUENCIES[note as usize]
}

/// Translates a stream of MIDI-style byte events into `EngineHandle`
/// calls. `NOTE_ON` with velocity `0` is treated as a note-off, per the
/// MIDI running-status convention.
pub struct MidiTranslator;

impl MidiTranslator {
    pub fn dispatch(engine: &EngineHandle, event: MidiEvent) {
        match event.kind {
            NOTE_ON => {
                let freq = note_frequency(event.data1);
                if event.data2 > 0 {
                    engine.trigger_note(freq);
                } else {
                    engine.trigger_note_off(Some(freq));
                }
            }
            NOTE_OFF => {
                engine.trigger_note_off(Some(note_frequency(event.data1)));
            }
            PITCH_BEND => {
                let raw = (((event.data2 as i32) << 7) | event.data1 as i32) - 8192;
                engine.set_pitch_bend(raw);
            }
            CONTROL_CHANGE if event.data1 == 7 => {
                let value = event.data2.min(127) as f32 / 127.0;
                let cutoff = 80.0 * (12_000.0f32 / 80.0).powf(value);
                engine.set_low_pass_cutoff(cutoff);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::new_engine;

    #[test]
    fn note_69_is_440_hz() {
        assert!((note_frequency(69) - 440.0).abs() < 0.01);
    }

    #[test]
    fn note_on_with_zero_velocity_is_note_off() {
        let (_engine, handle) = new_engine(44_100.0);
        MidiTranslator::dispatch(&handle, MidiEvent { kind: NOTE_ON, data1: 69, data2: 100 });
        assert_eq!(handle.active_note_count(), 1);
        MidiTranslator::dispatch(&handle, MidiEvent { kind: NOTE_ON, data1: 69, data2: 0 });
        assert_eq!(handle.active_note_count(), 0);
    }

    #[test]
    fn control_change_7_maps_cutoff_endpoints() {
        let (_engine, handle) = new_engine(44_100.0);
        MidiTranslator::dispatch(&handle, MidiEvent { kind: NOTE_ON, data1: 69, data2: 100 });
        MidiTranslator::dispatch(&handle, MidiEvent { kind: CONTROL_CHANGE, data1: 7, data2: 0 });
        assert!((handle.get_low_pass_cutoff() - 80.0).abs() < 0.5);
        MidiTranslator::dispatch(&handle, MidiEvent { kind: CONTROL_CHANGE, data1: 7, data2: 127 });
        assert!((handle.get_low_pass_cutoff() - 12_000.0).abs() < 50.0);
    }

    #[test]
    fn note_off_removes_matching_note_only() {
        let (_engine, handle) = new_engine(44_100.0);
        MidiTranslator::dispatch(&handle, MidiEvent { kind: NOTE_ON, data1: 69, data2: 100 });
        MidiTranslator::dispatch(&handle, MidiEvent { kind: NOTE_ON, data1: 71, data2: 100 });
        MidiTranslator::dispatch(&handle, MidiEvent { kind: NOTE_OFF, data1: 69, data2: 0 });
        assert_eq!(handle.active_note_count(), 1);
    }
}
