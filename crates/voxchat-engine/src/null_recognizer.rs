use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use voxchat_core::{AudioChunk, EngineError, RecognizerEvent, Segment};

use crate::recognizer::SpeechRecognizer;

/// Recognizer that produces a placeholder segment per fed chunk. Useful for
/// wiring and tests when no real engine is configured.
pub struct NullRecognizer {
    active: AtomicBool,
    feed_count: AtomicUsize,
    event_sender: Mutex<Option<mpsc::UnboundedSender<RecognizerEvent>>>,
}

impl NullRecognizer {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            feed_count: AtomicUsize::new(0),
            event_sender: Mutex::new(None),
        }
    }

    pub fn feed_count(&self) -> usize {
        self.feed_count.load(Ordering::Relaxed)
    }

    fn emit(&self, event: RecognizerEvent) {
        if let Ok(sender) = self.event_sender.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(event);
            }
        }
    }
}

impl Default for NullRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for NullRecognizer {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), EngineError> {
        Ok(())
    }

    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<RecognizerEvent>) {
        *self.event_sender.lock().unwrap() = Some(sender);
    }

    async fn start(&self) -> Result<(), EngineError> {
        self.active.store(true, Ordering::Relaxed);
        self.emit(RecognizerEvent::Started);
        Ok(())
    }

    async fn feed_audio(&self, chunk: AudioChunk) -> Result<(), EngineError> {
        if !self.active.load(Ordering::Relaxed) {
            return Ok(());
        }
        let count = self.feed_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.emit(RecognizerEvent::Result {
            segments: vec![Segment::finalized(format!(
                "[null] {} samples ",
                chunk.samples.len()
            ))],
        });
        tracing::trace!("NullRecognizer fed chunk #{count}, {} samples", chunk.samples.len());
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        if self.active.swap(false, Ordering::Relaxed) {
            self.emit(RecognizerEvent::Ended);
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_recognizer_name() {
        let engine = NullRecognizer::new();
        assert_eq!(engine.name(), "null");
    }

    #[tokio::test]
    async fn test_start_emits_started() {
        let mut engine = NullRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine.start().await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), RecognizerEvent::Started);
    }

    #[tokio::test]
    async fn test_feed_emits_finalized_segment() {
        let mut engine = NullRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine.start().await.unwrap();
        let _ = rx.try_recv();

        let chunk = AudioChunk {
            samples: vec![0.0; 480],
            sample_rate: 16000,
            channels: 1,
        };
        engine.feed_audio(chunk).await.unwrap();
        match rx.try_recv().unwrap() {
            RecognizerEvent::Result { segments } => {
                assert_eq!(segments.len(), 1);
                assert!(segments[0].is_final);
                assert!(segments[0].text.contains("480"));
            }
            other => panic!("expected Result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_feed_before_start_is_dropped() {
        let mut engine = NullRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        let chunk = AudioChunk {
            samples: vec![0.0; 100],
            sample_rate: 16000,
            channels: 1,
        };
        engine.feed_audio(chunk).await.unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.feed_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_emits_ended_once() {
        let mut engine = NullRecognizer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.set_event_sender(tx);
        engine.start().await.unwrap();
        let _ = rx.try_recv();

        engine.stop().await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), RecognizerEvent::Ended);

        // Second stop is a no-op
        engine.stop().await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_null_recognizer_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullRecognizer>();
    }
}
