//! The phrase aggregator: drains the ingest queue, decides phrase
//! boundaries, and commits transcriptions.

use crate::defaults;
use crate::stt::transcriber::Transcriber;
use crate::transcript::clock::{Clock, SystemClock};
use crate::transcript::pcm;
use crate::transcript::queue::ChunkQueue;
use crate::transcript::sink::{TranscriptSink, TranscriptUpdate};
use crate::transcript::state::Transcript;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the aggregator loop.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    /// Silence between processed batches that finalizes the current phrase.
    pub phrase_timeout: Duration,
    /// Sleep interval while the queue is empty.
    pub poll_interval: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            phrase_timeout: Duration::from_millis(defaults::PHRASE_TIMEOUT_MS as u64),
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS as u64),
        }
    }
}

/// What one aggregator iteration did.
#[derive(Debug, Clone, PartialEq)]
pub enum Iteration {
    /// Queue was empty; the run loop sleeps and retries.
    Idle,
    /// A batch was transcribed and committed to the transcript.
    Committed { finalized: bool, text: String },
    /// Transcription failed; the batch was dropped, state untouched.
    Skipped,
}

/// The streaming aggregation state machine.
///
/// Sole owner of the transcript and the phrase timer. The queue is the only
/// state shared with the capture side. Each non-final iteration
/// re-transcribes the entire audio accumulated since the last boundary:
/// recognition quality improves with context, so repeated compute is traded
/// for better incremental accuracy.
///
/// The loop is a busy-poll with a fixed sleep, not an event-driven wake.
/// That keeps the design to one thread and one lock at the cost of up to
/// one `poll_interval` of extra latency per batch.
pub struct Aggregator {
    config: AggregatorConfig,
    queue: Arc<ChunkQueue>,
    transcriber: Arc<dyn Transcriber>,
    transcript: Transcript,
    last_update: Option<Instant>,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    /// Creates an aggregator over the given queue and transcriber.
    pub fn new(
        config: AggregatorConfig,
        queue: Arc<ChunkQueue>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            queue,
            transcriber,
            transcript: Transcript::new(),
            last_update: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current transcript state.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs one iteration of the aggregation loop.
    ///
    /// Returns [`Iteration::Idle`] without touching any state when the queue
    /// is empty; the caller decides how long to sleep. Otherwise drains the
    /// queue fully, transcribes the merged batch, and commits.
    ///
    /// The phrase boundary check measures time since the previous processed
    /// batch, not since the end of speech. Under continuous speech this is
    /// the inter-poll gap; if an iteration stalls (a slow transcription
    /// call), the next batch may start a new phrase spuriously. That exact
    /// behavior is kept on purpose.
    pub fn poll_once(&mut self, sinks: &mut [Box<dyn TranscriptSink>]) -> Iteration {
        if self.queue.is_empty() {
            return Iteration::Idle;
        }

        let now = self.clock.now();
        let phrase_complete = self
            .last_update
            .is_some_and(|last| now.duration_since(last) > self.config.phrase_timeout);
        let previous_update = self.last_update;
        self.last_update = Some(now);

        // Everything that arrived since the last drain, including trailing
        // audio of a previous partial phrase. Nothing is discarded, there is
        // no overlap or rewind.
        let pending = pcm::merge_chunks(self.queue.drain_all());
        let samples = pcm::bytes_to_f32(&pending);

        let text = match self.transcriber.transcribe(&samples) {
            Ok(result) => result.text.trim().to_string(),
            Err(e) => {
                // Skip the commit, leave transcript and phrase timer exactly
                // as they were before this batch, keep the loop alive.
                self.last_update = previous_update;
                eprintln!("livecap: transcription failed, batch skipped: {e}");
                return Iteration::Skipped;
            }
        };

        if phrase_complete {
            self.transcript.push_phrase(text.clone());
        } else {
            self.transcript.replace_live(text.clone());
        }

        let update = TranscriptUpdate {
            finalized: phrase_complete,
            text: text.clone(),
            transcript: self.transcript.lines().to_vec(),
        };
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.publish(&update) {
                eprintln!("livecap: {} sink failed: {e}", sink.name());
            }
        }

        Iteration::Committed {
            finalized: phrase_complete,
            text,
        }
    }

    /// Spawns the aggregation loop on its own thread.
    ///
    /// The loop runs until the handle is stopped. Cancellation is
    /// cooperative at iteration boundaries; an in-flight transcription call
    /// is never interrupted.
    pub fn spawn(self, sinks: Vec<Box<dyn TranscriptSink>>) -> AggregatorHandle {
        let running = Arc::new(AtomicBool::new(true));
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);

        let loop_running = Arc::clone(&running);
        let thread = thread::spawn(move || {
            let mut aggregator = self;
            let mut sinks = sinks;
            while loop_running.load(Ordering::SeqCst) {
                if let Iteration::Idle = aggregator.poll_once(&mut sinks) {
                    thread::sleep(aggregator.config.poll_interval);
                }
            }
            let _ = result_tx.send(aggregator.transcript.into_lines());
        });

        AggregatorHandle {
            running,
            thread: Some(thread),
            result_rx,
        }
    }
}

/// Handle to a running aggregator.
pub struct AggregatorHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    result_rx: crossbeam_channel::Receiver<Vec<String>>,
}

impl AggregatorHandle {
    /// Stops the loop and returns the final transcript.
    ///
    /// Waits up to 5s for an in-flight transcription to finish. After the
    /// deadline the thread is detached (it dies with the process) and the
    /// transcript is returned as far as it got (empty if nothing arrived).
    pub fn stop(mut self) -> Vec<String> {
        self.running.store(false, Ordering::SeqCst);

        match self.result_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(lines) => {
                if let Some(thread) = self.thread.take()
                    && thread.join().is_err()
                {
                    eprintln!("livecap: aggregator thread panicked");
                }
                lines
            }
            Err(_) => {
                eprintln!("livecap: shutdown timeout — aggregator still transcribing, detaching");
                // Dropping the JoinHandle detaches the thread.
                Vec::new()
            }
        }
    }

    /// Returns true while the loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::transcriber::{MockTranscriber, Transcriber, Transcription};
    use crate::transcript::clock::MockClock;
    use crate::transcript::sink::CollectorSink;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn test_config() -> AggregatorConfig {
        AggregatorConfig {
            phrase_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// `samples` silent samples in the queue's byte format.
    fn chunk_bytes(samples: usize) -> Vec<u8> {
        vec![0u8; samples * 2]
    }

    fn setup(
        transcriber: Arc<dyn Transcriber>,
    ) -> (Aggregator, Arc<ChunkQueue>, Arc<MockClock>) {
        let queue = Arc::new(ChunkQueue::new());
        let clock = Arc::new(MockClock::new());
        let aggregator = Aggregator::new(test_config(), Arc::clone(&queue), transcriber)
            .with_clock(clock.clone() as Arc<dyn Clock>);
        (aggregator, queue, clock)
    }

    /// Transcriber that counts invocations and records how many samples it
    /// was fed, for the data-loss and idle-poll properties.
    struct RecordingTranscriber {
        calls: AtomicUsize,
        samples_seen: AtomicUsize,
        responses: Mutex<Vec<String>>,
    }

    impl RecordingTranscriber {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                samples_seen: AtomicUsize::new(0),
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn samples_seen(&self) -> usize {
            self.samples_seen.load(Ordering::SeqCst)
        }
    }

    impl Transcriber for RecordingTranscriber {
        fn transcribe(&self, audio: &[f32]) -> crate::error::Result<Transcription> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.samples_seen.fetch_add(audio.len(), Ordering::SeqCst);
            let text = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "out of responses".to_string());
            Ok(Transcription::from_text(text))
        }

        fn model_name(&self) -> &str {
            "recording"
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_empty_queue_is_idle_and_never_transcribes() {
        let transcriber = Arc::new(RecordingTranscriber::new(vec![]));
        let (mut aggregator, _queue, _clock) = setup(transcriber.clone());
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        for _ in 0..10 {
            assert_eq!(aggregator.poll_once(&mut sinks), Iteration::Idle);
        }

        assert_eq!(transcriber.calls(), 0);
        assert!(aggregator.transcript().is_blank());
    }

    #[test]
    fn test_rapid_batches_overwrite_single_phrase() {
        let transcriber = Arc::new(RecordingTranscriber::new(vec![
            "hello",
            "hello there",
            "hello there world",
        ]));
        let (mut aggregator, queue, clock) = setup(transcriber.clone());
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        for expected in ["hello", "hello there", "hello there world"] {
            queue.push(chunk_bytes(1600));
            let outcome = aggregator.poll_once(&mut sinks);
            assert_eq!(
                outcome,
                Iteration::Committed {
                    finalized: false,
                    text: expected.to_string()
                }
            );
            // Well under the 3s phrase timeout
            clock.advance(Duration::from_millis(300));
        }

        assert_eq!(aggregator.transcript().len(), 1);
        assert_eq!(aggregator.transcript().live(), "hello there world");
    }

    #[test]
    fn test_gap_over_timeout_starts_new_phrase() {
        let transcriber = Arc::new(RecordingTranscriber::new(vec!["first", "second"]));
        let (mut aggregator, queue, clock) = setup(transcriber);
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        queue.push(chunk_bytes(32000));
        assert_eq!(
            aggregator.poll_once(&mut sinks),
            Iteration::Committed {
                finalized: false,
                text: "first".to_string()
            }
        );
        assert_eq!(aggregator.transcript().len(), 1);

        // Silence longer than the phrase timeout
        clock.advance(Duration::from_secs(4));

        queue.push(chunk_bytes(16000));
        assert_eq!(
            aggregator.poll_once(&mut sinks),
            Iteration::Committed {
                finalized: true,
                text: "second".to_string()
            }
        );

        let lines = aggregator.transcript().lines();
        assert_eq!(lines, &["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_gap_exactly_at_timeout_does_not_finalize() {
        // Boundary is strict: gap must exceed the timeout
        let transcriber = Arc::new(RecordingTranscriber::new(vec!["a", "b"]));
        let (mut aggregator, queue, clock) = setup(transcriber);
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        queue.push(chunk_bytes(100));
        aggregator.poll_once(&mut sinks);

        clock.advance(Duration::from_secs(3));
        queue.push(chunk_bytes(100));
        assert_eq!(
            aggregator.poll_once(&mut sinks),
            Iteration::Committed {
                finalized: false,
                text: "b".to_string()
            }
        );
        assert_eq!(aggregator.transcript().len(), 1);
    }

    #[test]
    fn test_first_iteration_never_finalizes() {
        // No previous batch → no gap, even after a long wait
        let transcriber = Arc::new(RecordingTranscriber::new(vec!["opening words"]));
        let (mut aggregator, queue, clock) = setup(transcriber);
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        clock.advance(Duration::from_secs(60));
        queue.push(chunk_bytes(100));
        assert_eq!(
            aggregator.poll_once(&mut sinks),
            Iteration::Committed {
                finalized: false,
                text: "opening words".to_string()
            }
        );
        assert_eq!(aggregator.transcript().len(), 1);
    }

    #[test]
    fn test_all_pushed_audio_reaches_the_transcriber() {
        let transcriber = Arc::new(RecordingTranscriber::new(vec!["x"; 20]));
        let (mut aggregator, queue, clock) = setup(transcriber.clone());
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        let mut pushed_bytes = 0usize;
        for round in 1..=5usize {
            // Several chunks per drain, uneven sizes
            for i in 0..round {
                let chunk = chunk_bytes(100 * (i + 1));
                pushed_bytes += chunk.len();
                queue.push(chunk);
            }
            aggregator.poll_once(&mut sinks);
            clock.advance(Duration::from_millis(100));
        }

        assert_eq!(transcriber.samples_seen(), pushed_bytes / 2);
    }

    #[test]
    fn test_failed_batch_leaves_state_untouched() {
        let transcriber = Arc::new(
            MockTranscriber::new("test-model")
                .with_response("kept")
                .with_failure_after(1),
        );
        let (mut aggregator, queue, clock) = setup(transcriber);
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

        queue.push(chunk_bytes(1600));
        aggregator.poll_once(&mut sinks);
        let transcript_before = aggregator.transcript().clone();
        let timer_before = aggregator.last_update;

        // This batch fails inside the adapter
        clock.advance(Duration::from_millis(500));
        queue.push(chunk_bytes(1600));
        assert_eq!(aggregator.poll_once(&mut sinks), Iteration::Skipped);

        assert_eq!(aggregator.transcript(), &transcript_before);
        assert_eq!(aggregator.last_update, timer_before);

        // Loop stays alive: queue was consumed, next poll is idle
        assert_eq!(aggregator.poll_once(&mut sinks), Iteration::Idle);
    }

    #[test]
    fn test_sink_failure_does_not_halt_the_loop() {
        struct FailingSink;
        impl TranscriptSink for FailingSink {
            fn publish(&mut self, _update: &TranscriptUpdate) -> crate::error::Result<()> {
                Err(crate::error::LivecapError::FeedConnection {
                    message: "client gone".to_string(),
                })
            }
            fn name(&self) -> &'static str {
                "failing"
            }
        }

        let transcriber = Arc::new(RecordingTranscriber::new(vec!["still here"]));
        let (mut aggregator, queue, _clock) = setup(transcriber);
        let collector = CollectorSink::new();
        let mut sinks: Vec<Box<dyn TranscriptSink>> =
            vec![Box::new(FailingSink), Box::new(collector.clone())];

        queue.push(chunk_bytes(100));
        let outcome = aggregator.poll_once(&mut sinks);
        assert!(matches!(outcome, Iteration::Committed { .. }));

        // The sink after the failing one still got the update
        assert_eq!(collector.updates().len(), 1);
        assert_eq!(collector.updates()[0].text, "still here");
    }

    #[test]
    fn test_updates_carry_full_transcript() {
        let transcriber = Arc::new(RecordingTranscriber::new(vec!["one", "two"]));
        let (mut aggregator, queue, clock) = setup(transcriber);
        let collector = CollectorSink::new();
        let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![Box::new(collector.clone())];

        queue.push(chunk_bytes(100));
        aggregator.poll_once(&mut sinks);
        clock.advance(Duration::from_secs(5));
        queue.push(chunk_bytes(100));
        aggregator.poll_once(&mut sinks);

        let updates = collector.updates();
        assert_eq!(updates[0].transcript, vec!["one".to_string()]);
        assert_eq!(
            updates[1].transcript,
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn test_spawned_loop_processes_and_stops() {
        let queue = Arc::new(ChunkQueue::new());
        let transcriber = Arc::new(MockTranscriber::new("test-model").with_response("spawned"));
        let config = AggregatorConfig {
            phrase_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(5),
        };
        let aggregator = Aggregator::new(config, Arc::clone(&queue), transcriber);

        let collector = CollectorSink::new();
        let handle = aggregator.spawn(vec![Box::new(collector.clone())]);
        assert!(handle.is_running());

        queue.push(chunk_bytes(1600));

        // Eventual processing only — no assumption about the poll interval
        let deadline = Instant::now() + Duration::from_secs(2);
        while collector.updates().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!collector.updates().is_empty(), "chunk was never processed");

        let lines = handle.stop();
        assert_eq!(lines, vec!["spawned".to_string()]);
    }

    #[test]
    fn test_stop_without_input_returns_seed_transcript() {
        let queue = Arc::new(ChunkQueue::new());
        let transcriber = Arc::new(MockTranscriber::new("test-model"));
        let aggregator = Aggregator::new(test_config(), queue, transcriber);

        let handle = aggregator.spawn(vec![]);
        let lines = handle.stop();
        assert_eq!(lines, vec![String::new()]);
    }

    #[test]
    fn test_config_default_values() {
        let config = AggregatorConfig::default();
        assert_eq!(config.phrase_timeout, Duration::from_millis(3000));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }
}
