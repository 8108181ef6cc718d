use async_trait::async_trait;
use tokio::sync::mpsc;
use voxchat_core::{AudioChunk, EngineError, RecognizerEvent};

/// A continuous speech recognizer. Implementations emit [`RecognizerEvent`]s
/// through the sender installed with [`set_event_sender`]; events are
/// delivered in order and only one session is active at a time.
///
/// [`set_event_sender`]: SpeechRecognizer::set_event_sender
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn name(&self) -> &str;
    async fn initialize(&mut self, config: toml::Value) -> Result<(), EngineError>;
    fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<RecognizerEvent>);
    /// Begin a recognition session. Must emit `Started` once active.
    async fn start(&self) -> Result<(), EngineError>;
    async fn feed_audio(&self, chunk: AudioChunk) -> Result<(), EngineError>;
    /// End the current session. Must emit `Ended`. Idempotent.
    async fn stop(&self) -> Result<(), EngineError>;
    async fn shutdown(&self) -> Result<(), EngineError>;
}
