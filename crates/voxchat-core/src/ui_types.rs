use crate::types::ChatMessage;

/// Baseline amplitude scale when no audio is playing.
pub const AMPLITUDE_IDLE: f32 = 0.9;

/// Lifecycle of the speech capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Listening,
    /// A stop was requested; end-of-session events are expected and must not
    /// trigger an auto-restart.
    Stopping,
}

/// Aggregate chat state broadcast to the TUI via watch channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    pub messages: Vec<ChatMessage>,
    pub phase: SessionPhase,
    /// Finalized transcript accumulated during the current recording.
    pub transcript: String,
    /// Provisional recognizer text, replaced on every result event.
    pub interim: String,
    pub is_processing: bool,
    pub is_playing: bool,
    pub muted: bool,
    /// Playback amplitude scale in `[0.9, 1.15]`.
    pub amplitude: f32,
    pub error: Option<String>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            phase: SessionPhase::default(),
            transcript: String::new(),
            interim: String::new(),
            is_processing: false,
            is_playing: false,
            muted: false,
            amplitude: AMPLITUDE_IDLE,
            error: None,
        }
    }
}

/// Commands sent from TUI → main via mpsc channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    ToggleRecording,
    ToggleMute,
    Quit,
}
