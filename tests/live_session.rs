//! End-to-end tests of the live aggregation pipeline through the public API.

use livecap::transcript::clock::{Clock, MockClock};
use livecap::{
    Aggregator, AggregatorConfig, ChunkQueue, CollectorSink, FeedEvent, FeedSink, MockTranscriber,
    Transcriber, Transcription, TranscriptSink,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn config() -> AggregatorConfig {
    AggregatorConfig {
        phrase_timeout: Duration::from_secs(3),
        poll_interval: Duration::from_millis(5),
    }
}

/// `seconds` of silence in the queue's byte format (16kHz, 16-bit).
fn seconds_of_audio(seconds: f32) -> Vec<u8> {
    vec![0u8; (seconds * 16000.0) as usize * 2]
}

/// Scripted transcriber returning one response per call.
struct ScriptedTranscriber {
    responses: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedTranscriber {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&self, _audio: &[f32]) -> livecap::Result<Transcription> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self
            .responses
            .get(call)
            .cloned()
            .unwrap_or_else(|| "unexpected call".to_string());
        Ok(Transcription::from_text(text))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[test]
fn two_chunk_session_with_forced_gap() {
    // Push one 2-second chunk, process → transcript is [text1].
    // Push another after a gap beyond the phrase timeout, process →
    // transcript is [text1, text2] and text1 is unchanged.
    let queue = Arc::new(ChunkQueue::new());
    let clock = Arc::new(MockClock::new());
    let transcriber = Arc::new(ScriptedTranscriber::new(&["text1", "text2"]));

    let mut aggregator = Aggregator::new(config(), Arc::clone(&queue), transcriber)
        .with_clock(clock.clone() as Arc<dyn Clock>);
    let collector = CollectorSink::new();
    let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![Box::new(collector.clone())];

    queue.push(seconds_of_audio(2.0));
    aggregator.poll_once(&mut sinks);
    assert_eq!(aggregator.transcript().lines(), &["text1".to_string()]);

    clock.advance(Duration::from_secs(4));
    queue.push(seconds_of_audio(1.0));
    aggregator.poll_once(&mut sinks);

    assert_eq!(
        aggregator.transcript().lines(),
        &["text1".to_string(), "text2".to_string()]
    );

    let updates = collector.updates();
    assert_eq!(updates.len(), 2);
    assert!(!updates[0].finalized);
    assert!(updates[1].finalized);
    // text1 is untouched by the second commit
    assert_eq!(updates[1].transcript[0], "text1");
}

#[test]
fn continuous_speech_stays_on_one_line() {
    let queue = Arc::new(ChunkQueue::new());
    let clock = Arc::new(MockClock::new());
    let transcriber = Arc::new(ScriptedTranscriber::new(&[
        "the",
        "the quick",
        "the quick brown fox",
    ]));

    let mut aggregator = Aggregator::new(config(), Arc::clone(&queue), transcriber)
        .with_clock(clock.clone() as Arc<dyn Clock>);
    let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![];

    for _ in 0..3 {
        queue.push(seconds_of_audio(0.5));
        aggregator.poll_once(&mut sinks);
        clock.advance(Duration::from_millis(500));
    }

    assert_eq!(aggregator.transcript().len(), 1);
    assert_eq!(aggregator.transcript().live(), "the quick brown fox");
}

#[test]
fn spawned_session_eventually_processes_pushed_audio() {
    let queue = Arc::new(ChunkQueue::new());
    let transcriber = Arc::new(MockTranscriber::new("test-model").with_response("eventual"));
    let aggregator = Aggregator::new(config(), Arc::clone(&queue), transcriber);

    let collector = CollectorSink::new();
    let handle = aggregator.spawn(vec![Box::new(collector.clone())]);

    queue.push(seconds_of_audio(1.0));

    // Only eventual processing is guaranteed, no particular poll cadence
    let deadline = Instant::now() + Duration::from_secs(2);
    while collector.updates().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    let lines = handle.stop();
    assert_eq!(lines, vec!["eventual".to_string()]);
}

#[tokio::test]
async fn feed_clients_see_live_updates() {
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpStream;

    // Find a free port, then serve on it
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);

    let server = Arc::new(livecap::FeedServer::new(addr));
    let accept_server = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = accept_server.start().await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let mut lines = BufReader::new(stream).lines();
    let hello = lines.next_line().await.unwrap().unwrap();
    assert!(matches!(
        FeedEvent::from_json(&hello).unwrap(),
        FeedEvent::Hello { .. }
    ));

    // Drive the aggregator with the feed sink attached, as the app wires it
    let queue = Arc::new(ChunkQueue::new());
    let transcriber = Arc::new(MockTranscriber::new("test-model").with_response("pushed live"));
    let mut aggregator = Aggregator::new(config(), Arc::clone(&queue), transcriber);
    let mut sinks: Vec<Box<dyn TranscriptSink>> = vec![Box::new(FeedSink::new(server.events()))];

    queue.push(seconds_of_audio(0.5));
    aggregator.poll_once(&mut sinks);

    let line = lines.next_line().await.unwrap().unwrap();
    match FeedEvent::from_json(&line).unwrap() {
        FeedEvent::Phrase {
            finalized,
            text,
            transcript,
        } => {
            assert!(!finalized);
            assert_eq!(text, "pushed live");
            assert_eq!(transcript, vec!["pushed live".to_string()]);
        }
        other => panic!("Expected Phrase event, got {other:?}"),
    }

    server.stop().await;
}
