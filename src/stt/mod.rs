//! Speech-to-text backend boundary.

pub mod remote;
pub mod transcriber;

pub use remote::{RemoteConfig, RemoteTranscriber};
pub use transcriber::{MockTranscriber, Transcriber};
