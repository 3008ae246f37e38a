use thiserror::Error;

/// Errors surfaced at the engine's construction / device-open boundary.
///
/// Every other public entry point clamps or ignores invalid input instead
/// of returning an `Err`; the audio callback itself never produces one of
/// these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to open host audio device: {0}")]
    HostError(String),
}
