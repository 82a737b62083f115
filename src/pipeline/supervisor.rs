//! Pipeline orchestration: capture thread, bounded frame queue, worker thread.
//!
//! The capture thread slices source audio into fixed frames and never waits
//! on the network; the worker owns chunking, transcription, dedup, scoring,
//! and output. A live source that outruns the queue loses frames rather than
//! stalling capture.

use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::{CallguardError, Result};
use crate::pipeline::chunker::{Chunker, ChunkerConfig};
use crate::pipeline::dedup::OverlapDeduplicator;
use crate::pipeline::sink::TranscriptSink;
use crate::pipeline::types::{Frame, TranscriptFragment};
use crate::risk::scanner::RiskScanner;
use crate::stt::transcriber::Transcriber;
use crossbeam_channel::{bounded, RecvTimeoutError, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Chunk extraction parameters.
    pub chunker: ChunkerConfig,
    /// Samples per frame handed to the queue.
    pub frame_samples: usize,
    /// Frame queue capacity.
    pub queue_capacity: usize,
    /// Pipeline sample rate.
    pub sample_rate: u32,
    /// Suppress informational output.
    pub quiet: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            frame_samples: defaults::FRAME_SAMPLES,
            queue_capacity: defaults::FRAME_QUEUE_CAPACITY,
            sample_rate: defaults::SAMPLE_RATE,
            quiet: false,
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    result_rx: Option<crossbeam_channel::Receiver<Option<String>>>,
}

impl PipelineHandle {
    /// Stops the pipeline gracefully and returns the sink's accumulated
    /// result.
    ///
    /// An in-flight transcription completes; audio still queued behind it
    /// is discarded. Waits up to 5s for the result, then 1s for threads to
    /// finish; after that, remaining threads are detached and die with the
    /// process.
    pub fn stop(mut self) -> Option<String> {
        self.running.store(false, Ordering::SeqCst);

        let result = self
            .result_rx
            .take()
            .and_then(|rx| rx.recv_timeout(Duration::from_secs(5)).ok().flatten());

        let deadline = Instant::now() + Duration::from_secs(1);
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("callguard: pipeline thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "callguard: shutdown timeout — {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }

        result
    }

    /// Blocks until a finite source is fully processed, then returns the
    /// sink's result. Only meaningful for file playback; a live pipeline
    /// never completes on its own.
    pub fn wait(mut self) -> Option<String> {
        let result = self
            .result_rx
            .take()
            .and_then(|rx| rx.recv().ok().flatten());

        for handle in self.threads.drain(..) {
            if let Err(panic_info) = handle.join() {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                    .unwrap_or("unknown panic");
                eprintln!("callguard: pipeline thread panicked: {msg}");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        result
    }

    /// Returns true if the pipeline has not been told to stop and has not
    /// finished on its own.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Pipeline: AudioSource → frame queue → chunker → transcriber → dedup →
/// risk scanner → sink.
pub struct PipelineSupervisor {
    config: SupervisorConfig,
}

impl PipelineSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    /// Starts the pipeline.
    ///
    /// # Errors
    /// Fails if the chunker config is invalid or the source cannot start.
    pub fn start(
        self,
        mut audio_source: Box<dyn AudioSource>,
        transcriber: Arc<dyn Transcriber>,
        sink: Box<dyn TranscriptSink>,
        scanner: RiskScanner,
    ) -> Result<PipelineHandle> {
        if !self.config.chunker.is_valid() {
            return Err(CallguardError::ConfigInvalidValue {
                key: "chunking.overlap".to_string(),
                message: "overlap must be strictly shorter than the chunk".to_string(),
            });
        }

        let running = Arc::new(AtomicBool::new(true));
        let (frame_tx, frame_rx) = bounded::<Frame>(self.config.queue_capacity);
        let (result_tx, result_rx) = bounded(1);

        audio_source.start()?;
        let source_is_finite = audio_source.is_finite();

        let quiet = self.config.quiet;
        let frame_samples = self.config.frame_samples;

        // Capture thread: poll the source at ~60Hz and slice into frames.
        let capture_running = running.clone();
        let capture_handle = thread::spawn(move || {
            let poll_interval = Duration::from_millis(16);

            let mut carry: Vec<f32> = Vec::new();
            let mut sequence: u64 = 0;
            let mut dropped_frames: u64 = 0;
            let mut consecutive_errors: u32 = 0;
            const MAX_CONSECUTIVE_ERRORS: u32 = 10;

            'capture: while capture_running.load(Ordering::SeqCst) {
                let samples = match audio_source.read_samples() {
                    Ok(s) => {
                        consecutive_errors = 0;
                        s
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            eprintln!(
                                "callguard: audio capture failed {consecutive_errors} times in a row: {e}"
                            );
                            eprintln!("callguard: check your microphone connection and try again");
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                if samples.is_empty() {
                    if source_is_finite {
                        // File source exhausted.
                        break;
                    }
                    // Live source: empty reads are normal while the device
                    // initializes. Keep polling.
                    thread::sleep(poll_interval);
                    continue;
                }

                carry.extend_from_slice(&samples);

                while carry.len() >= frame_samples {
                    let frame_samples_vec: Vec<f32> = carry.drain(..frame_samples).collect();
                    let frame = Frame::new(sequence, frame_samples_vec);
                    sequence += 1;

                    if source_is_finite {
                        // File audio must not be lost; block until the
                        // worker catches up.
                        if frame_tx.send(frame).is_err() {
                            break 'capture;
                        }
                    } else {
                        match frame_tx.try_send(frame) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                if dropped_frames == 0 {
                                    eprintln!(
                                        "callguard: frame queue full, dropping audio \
                                         (backend slower than real time)"
                                    );
                                }
                                dropped_frames += 1;
                            }
                            Err(TrySendError::Disconnected(_)) => break 'capture,
                        }
                    }
                }

                if !source_is_finite {
                    thread::sleep(poll_interval);
                }
            }

            if dropped_frames > 0 && !quiet {
                eprintln!("callguard: dropped {dropped_frames} frame(s) during capture");
            }

            // Sub-frame remainder in `carry` is discarded; it cannot form a
            // frame and the chunker would discard it anyway.
            if let Err(e) = audio_source.stop() {
                eprintln!("callguard: failed to stop audio capture: {e}");
            }
            // frame_tx drops here; the worker drains the queue and finishes.
        });

        // Worker thread: chunk, transcribe, dedup, score, emit.
        let worker_running = running.clone();
        let chunker_config = self.config.chunker.clone();
        let worker_handle = thread::spawn(move || {
            let mut chunker = Chunker::new(chunker_config);
            let mut dedup = OverlapDeduplicator::new();
            let mut sink = sink;
            let poll_timeout = Duration::from_millis(defaults::QUEUE_POLL_TIMEOUT_MS);

            loop {
                if !worker_running.load(Ordering::SeqCst) {
                    // Cancelled. Whatever backend call was in flight has
                    // already returned; frames still queued behind it are
                    // stale and must not be transcribed.
                    break;
                }
                match frame_rx.recv_timeout(poll_timeout) {
                    Ok(frame) => {
                        for chunk in chunker.push(&frame) {
                            let text = match transcriber.transcribe(&chunk.samples) {
                                Ok(text) => text,
                                Err(e) => {
                                    // One lost chunk costs at most that
                                    // chunk's audio; the stream continues.
                                    eprintln!(
                                        "callguard: transcription failed for chunk {}: {e}",
                                        chunk.sequence
                                    );
                                    String::new()
                                }
                            };

                            let fragment = TranscriptFragment {
                                chunk_sequence: chunk.sequence,
                                text,
                            };

                            if let Some(delta) = dedup.apply(&fragment.text) {
                                let finding = scanner.scan(&delta);
                                if let Err(e) = sink.handle(&delta, &finding) {
                                    eprintln!("callguard: sink failed: {e}");
                                }
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        // Idle; loop back to re-check the flag.
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            let discarded = chunker.discard_partial();
            if discarded > 0 && !quiet {
                eprintln!(
                    "callguard: discarded {discarded} trailing sample(s) shorter than one chunk"
                );
            }

            worker_running.store(false, Ordering::SeqCst);
            let result = sink.finish();
            if result_tx.send(result).is_err() && !quiet {
                eprintln!("callguard: pipeline result receiver already dropped");
            }
        });

        Ok(PipelineHandle {
            running,
            threads: vec![capture_handle, worker_handle],
            result_rx: Some(result_rx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MockAudioSource;
    use crate::pipeline::sink::CollectorSink;
    use crate::stt::transcriber::MockTranscriber;

    /// Small geometry so tests complete in milliseconds: 10ms frames, 20ms
    /// chunks, 5ms overlap.
    fn test_config() -> SupervisorConfig {
        SupervisorConfig {
            chunker: ChunkerConfig {
                chunk_frames: 320,
                overlap_frames: 80,
            },
            frame_samples: 160,
            queue_capacity: 8,
            sample_rate: 16_000,
            quiet: true,
        }
    }

    #[test]
    fn config_default_matches_pipeline_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.frame_samples, 1_600);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.chunker.chunk_frames, 64_000);
        assert_eq!(config.chunker.overlap_frames, 16_000);
        assert!(!config.quiet);
    }

    #[test]
    fn invalid_chunker_config_is_rejected() {
        let config = SupervisorConfig {
            chunker: ChunkerConfig {
                chunk_frames: 100,
                overlap_frames: 100,
            },
            ..test_config()
        };

        let result = PipelineSupervisor::new(config).start(
            Box::new(MockAudioSource::new()),
            Arc::new(MockTranscriber::new()),
            Box::new(CollectorSink::new()),
            RiskScanner::new().unwrap(),
        );

        assert!(matches!(
            result,
            Err(CallguardError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn source_start_failure_propagates() {
        let result = PipelineSupervisor::new(test_config()).start(
            Box::new(MockAudioSource::new().with_start_failure()),
            Arc::new(MockTranscriber::new()),
            Box::new(CollectorSink::new()),
            RiskScanner::new().unwrap(),
        );

        assert!(matches!(result, Err(CallguardError::AudioCapture { .. })));
    }

    #[test]
    fn finite_source_runs_to_completion() {
        // 640 samples = 4 frames = 2 chunks (320-sample chunks, 80 overlap)
        let source = MockAudioSource::new().with_samples(vec![0.0; 640]);
        let transcriber = Arc::new(
            MockTranscriber::new().with_responses(&["hello there", "there friend"]),
        );

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber.clone(),
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        let result = handle.wait();
        assert_eq!(result, Some("hello there friend".to_string()));
        assert_eq!(transcriber.call_count(), 2);
        assert_eq!(transcriber.received_lengths(), vec![320, 320]);
    }

    #[test]
    fn backend_failure_loses_one_chunk_not_the_stream() {
        let source = MockAudioSource::new().with_samples(vec![0.0; 640]);
        let transcriber = Arc::new(
            MockTranscriber::new()
                .with_responses(&["lost text", "kept text"])
                .failing_on_call(0),
        );

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber.clone(),
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        let result = handle.wait();
        assert_eq!(result, Some("kept text".to_string()));
        assert_eq!(transcriber.call_count(), 2);
    }

    #[test]
    fn trailing_audio_shorter_than_a_chunk_is_discarded() {
        // 4 frames yield two chunks; 160 samples stay buffered and never
        // complete a third, so they are dropped at shutdown
        let source = MockAudioSource::new().with_samples(vec![0.0; 640]);
        let transcriber = Arc::new(MockTranscriber::new().with_response("x"));

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber.clone(),
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        let _ = handle.wait();
        assert_eq!(transcriber.call_count(), 2);
    }

    #[test]
    fn empty_transcripts_produce_no_output() {
        let source = MockAudioSource::new().with_samples(vec![0.0; 640]);
        let transcriber = Arc::new(MockTranscriber::new()); // returns ""

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber,
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        assert_eq!(handle.wait(), None);
    }

    #[test]
    fn live_source_stops_on_request() {
        let source = MockAudioSource::new().live();
        let probe = source.clone();
        let transcriber = Arc::new(MockTranscriber::new());

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber,
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        assert!(handle.is_running());
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        let result = handle.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(result, None);
        assert_eq!(probe.stop_count(), 1);
    }

    #[test]
    fn cancellation_discards_queued_audio() {
        // Ten frames delivered in one read make six chunks; the slow
        // backend keeps the first call in flight while the rest queue up.
        // After stop() the backlog must not be transcribed.
        let source = MockAudioSource::new().live().with_samples(vec![0.0; 1_600]);
        let transcriber = Arc::new(
            MockTranscriber::new()
                .with_response("backlogged text")
                .with_delay(Duration::from_millis(200)),
        );

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber.clone(),
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        let _ = handle.stop();

        // At most the in-flight call and one that started just before the
        // flag was observed; never the full backlog of six.
        assert!(
            transcriber.call_count() <= 2,
            "backlog was transcribed: {} calls",
            transcriber.call_count()
        );
    }

    #[test]
    fn finite_run_releases_the_source_exactly_once() {
        let source = MockAudioSource::new().with_samples(vec![0.0; 640]);
        let probe = source.clone();
        let transcriber = Arc::new(MockTranscriber::new().with_response("x"));

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber,
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        let _ = handle.wait();
        assert_eq!(probe.stop_count(), 1);
    }

    #[test]
    fn persistent_read_errors_shut_the_pipeline_down() {
        let source = MockAudioSource::new().live().with_read_failure();
        let transcriber = Arc::new(MockTranscriber::new());

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber,
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        // 10 errors at 16ms poll ≈ 160ms, then the capture thread exits and
        // the worker drains out
        thread::sleep(Duration::from_millis(400));
        assert!(!handle.is_running());
        assert_eq!(handle.stop(), None);
    }

    #[test]
    fn handle_is_running_tracks_flag() {
        let running = Arc::new(AtomicBool::new(true));
        let handle = PipelineHandle {
            running: running.clone(),
            threads: vec![],
            result_rx: None,
        };

        assert!(handle.is_running());
        running.store(false, Ordering::SeqCst);
        assert!(!handle.is_running());
    }

    #[test]
    fn handle_stop_returns_result_from_channel() {
        let (result_tx, result_rx) = bounded(1);
        result_tx.send(Some("collected text".to_string())).unwrap();
        drop(result_tx);

        let handle = PipelineHandle {
            running: Arc::new(AtomicBool::new(true)),
            threads: vec![],
            result_rx: Some(result_rx),
        };

        assert_eq!(handle.stop(), Some("collected text".to_string()));
    }

    #[test]
    fn handle_stop_survives_disconnected_result_channel() {
        let (result_tx, result_rx) = bounded::<Option<String>>(1);
        drop(result_tx);

        let handle = PipelineHandle {
            running: Arc::new(AtomicBool::new(true)),
            threads: vec![],
            result_rx: Some(result_rx),
        };

        assert_eq!(handle.stop(), None);
    }

    #[test]
    fn handle_stop_does_not_hang_on_stuck_thread() {
        let running = Arc::new(AtomicBool::new(true));
        let stuck_running = running.clone();
        let stuck_handle = thread::spawn(move || {
            while stuck_running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(10));
            }
            thread::park();
        });

        let handle = PipelineHandle {
            running: running.clone(),
            threads: vec![stuck_handle],
            result_rx: None,
        };

        let start = Instant::now();
        assert_eq!(handle.stop(), None);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!running.load(Ordering::SeqCst));
    }

    #[test]
    fn overlapping_fragments_are_deduplicated_end_to_end() {
        let source = MockAudioSource::new().with_samples(vec![0.0; 640]);
        let transcriber = Arc::new(MockTranscriber::new().with_responses(&[
            "please transfer the",
            "the money now",
        ]));

        let handle = PipelineSupervisor::new(test_config())
            .start(
                Box::new(source),
                transcriber,
                Box::new(CollectorSink::new()),
                RiskScanner::new().unwrap(),
            )
            .unwrap();

        assert_eq!(
            handle.wait(),
            Some("please transfer the money now".to_string())
        );
    }
}
