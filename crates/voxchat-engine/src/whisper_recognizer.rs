use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use voxchat_core::{AudioChunk, EngineError, RecognizerEvent};

use crate::recognizer::SpeechRecognizer;

pub struct WhisperRecognizer {
    model_path: Option<String>,
    language: Option<String>,
    active: AtomicBool,
    event_sender: Mutex<Option<mpsc::UnboundedSender<RecognizerEvent>>>,
}

impl WhisperRecognizer {
    pub fn new() -> Self {
        Self {
            model_path: None,
            language: None,
            active: AtomicBool::new(false),
            event_sender: Mutex::new(None),
        }
    }

    fn emit(&self, event: RecognizerEvent) {
        if let Ok(sender) = self.event_sender.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(event);
            }
        }
    }
}

impl Default for WhisperRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError> {
        let model_path = config
            .get("model_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                EngineError::InitializationFailed(
                    "missing 'model_path' in whisper config".to_string(),
                )
            })?;
        self.model_path = Some(model_path.to_string());

        self.language = config
            .get("language")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        tracing::info!(
            model_path = %model_path,
            language = ?self.language,
            "WhisperRecognizer initialized (stub, model not loaded)"
        );
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

    async fn feed_audio(&self, _chunk: AudioChunk) -> Result<(), EngineError> {
        // Stub: real inference deferred to when whisper-rs is actually wired
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
