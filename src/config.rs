use serde::Deserialize;

/// Host-supplied configuration record, the `serde`-deserializable shape of
/// the record described in the external-interfaces section of the design
/// doc. Fields the core engine doesn't act on (`buffer_frames`,
/// `midi_port`, `input_mode`, `sequence_type`) are accepted and stored for
/// the host to read back via `EngineHandle::config_echo`, but have no
/// effect on audio generation.
#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
    pub waveform_name: String,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default)]
    pub attack: f32,
    #[serde(default)]
    pub decay: f32,
    #[serde(default)]
    pub sustain: f32,
    #[serde(default)]
    pub release: f32,
    pub sample_rate: f32,
    #[serde(default)]
    pub buffer_frames: u32,
    #[serde(default)]
    pub midi_port: i32,
    #[serde(default)]
    pub default_frequency: f32,
    #[serde(default = "default_input_mode")]
    pub input_mode: String,
    #[serde(default)]
    pub sequence_type: String,
}

fn default_input_mode() -> String {
    "midi".to_string()
}
