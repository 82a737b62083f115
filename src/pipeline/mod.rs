//! Streaming pipeline: frames in, scored transcript deltas out.

pub mod chunker;
pub mod dedup;
pub mod sink;
pub mod supervisor;
pub mod types;

pub use chunker::{Chunker, ChunkerConfig};
pub use dedup::OverlapDeduplicator;
pub use sink::{CollectorSink, StdoutSink, TranscriptSink};
pub use supervisor::{PipelineHandle, PipelineSupervisor, SupervisorConfig};
pub use types::{Chunk, Frame, TranscriptFragment};
