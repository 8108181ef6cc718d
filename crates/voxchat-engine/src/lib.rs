pub mod driver;
pub mod null_recognizer;
pub mod recognizer;
pub mod registry;
pub mod session;
#[cfg(feature = "whisper")]
pub mod whisper_recognizer;

pub use driver::{DriverCommand, DriverHandle, DriverOutput, SessionDriver, SessionSnapshot};
pub use null_recognizer::NullRecognizer;
pub use recognizer::SpeechRecognizer;
pub use registry::EngineRegistry;
pub use session::{SessionEffect, SessionState};
#[cfg(feature = "whisper")]
pub use whisper_recognizer::WhisperRecognizer;
