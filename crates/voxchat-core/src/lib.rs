pub mod config;
pub mod error;
pub mod types;
pub mod ui_types;

pub use config::AppConfig;
pub use error::{AudioError, ClientError, ConfigError, EngineError, RecognizerError};
pub use types::{AudioChunk, AudioSource, ChatMessage, MessageRole, RecognizerEvent, Segment};
pub use ui_types::{ChatState, SessionPhase, UiCommand, AMPLITUDE_IDLE};
