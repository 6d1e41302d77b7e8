//! Announcement delivery: the producer/consumer channel, the slot that keeps
//! round-start bursts atomic, and the speech engines that voice each line.

mod channel;
mod slot;
mod speech;

pub use channel::{channel, Announcement, Consumed, Consumer, Publisher};
pub use slot::{ExclusiveSlot, SlotGuard};
pub use speech::{CommandSpeech, SilentSpeech, SpeechEngine};
