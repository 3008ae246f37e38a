use super::dsp::Effect;

/// Structural instructions that cross from a control/MIDI thread into the
/// audio-owned `Engine`. Scalar parameter changes never need this channel
/// — they flow straight through `Shared`'s atomics instead; only a change
/// in the *shape* of the effect chain needs to be applied at a sample
/// boundary rather than torn mid-render.
pub(crate) enum EngineCommand {
    SetEffectChain(Vec<Effect>),
}
