//! Audio input: capture devices, file decoding, and sample encoding.

pub mod capture;
pub mod source;
pub mod wav;

pub use capture::CpalAudioSource;
pub use source::{AudioSource, MockAudioSource};
pub use wav::WavAudioSource;
