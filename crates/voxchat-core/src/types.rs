use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::{AudioError, RecognizerError};

/// A block of captured or decoded audio samples.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Ai,
}

/// A single entry in the chat history. Immutable once constructed; the
/// message list is append-only and ordered by arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Creation timestamp in milliseconds since the epoch.
    pub id: i64,
    pub role: MessageRole,
    pub text: Option<String>,
    pub audio_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, text: Option<String>, audio_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            role,
            text,
            audio_url,
            timestamp: now,
        }
    }

    pub fn user(text: impl Into<String>, audio_url: Option<String>) -> Self {
        Self::new(MessageRole::User, Some(text.into()), audio_url)
    }

    pub fn ai(text: Option<String>, audio_url: Option<String>) -> Self {
        Self::new(MessageRole::Ai, text, audio_url)
    }
}

/// One piece of recognizer output. Finalized segments will not be revised;
/// non-final segments are provisional and replaced on the next result event.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub is_final: bool,
}

impl Segment {
    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// Typed events emitted by a speech recognizer session.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// A recognition session became active.
    Started,
    /// New results arrived, in delivery order.
    Result { segments: Vec<Segment> },
    /// The session failed; see [`RecognizerError`] for the taxonomy.
    Error(RecognizerError),
    /// The session ended (normally or after an error).
    Ended,
}

/// A raw-audio input that can be started and stopped in lockstep with a
/// recording session. Stopping must release the underlying device.
pub trait AudioSource: Send {
    /// Begin capture, pushing chunks into `tap` until stopped.
    fn start(&mut self, tap: mpsc::UnboundedSender<AudioChunk>) -> Result<(), AudioError>;

    /// Stop capture and release the device. Idempotent.
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_chunk_creation() {
        let chunk = AudioChunk {
            samples: vec![0.0, 0.5, -0.5, 1.0],
            sample_rate: 16000,
            channels: 1,
        };
        assert_eq!(chunk.samples.len(), 4);
        assert_eq!(chunk.sample_rate, 16000);
        assert_eq!(chunk.channels, 1);
    }

    #[test]
    fn test_user_message_fields() {
        let msg = ChatMessage::user("hello", None);
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.text.as_deref(), Some("hello"));
        assert!(msg.audio_url.is_none());
        assert_eq!(msg.id, msg.timestamp.timestamp_millis());
    }

    #[test]
    fn test_ai_message_fields() {
        let msg = ChatMessage::ai(Some("hi there".to_string()), Some("a.wav".to_string()));
        assert_eq!(msg.role, MessageRole::Ai);
        assert_eq!(msg.text.as_deref(), Some("hi there"));
        assert_eq!(msg.audio_url.as_deref(), Some("a.wav"));
    }

    #[test]
    fn test_segment_constructors() {
        assert!(Segment::finalized("done").is_final);
        assert!(!Segment::interim("maybe").is_final);
    }

    #[test]
    fn test_recognizer_event_clone_eq() {
        let ev = RecognizerEvent::Result {
            segments: vec![Segment::finalized("a"), Segment::interim("b")],
        };
        assert_eq!(ev.clone(), ev);
    }
}
