use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to enumerate devices: {0}")]
    DeviceEnumeration(String),

    #[error("microphone unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("failed to build stream: {0}")]
    StreamBuild(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("failed to encode audio: {0}")]
    Encode(String),

    #[error("failed to decode audio: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recognizer initialization failed: {0}")]
    InitializationFailed(String),

    #[error("recognizer processing failed: {0}")]
    ProcessingFailed(String),

    #[error("recognizer engine not found: {0}")]
    EngineNotFound(String),
}

/// The recognition error taxonomy. `Aborted` and `NoSpeech` are benign and
/// never surfaced; `Network` is retried with capped backoff; everything else
/// is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognizerError {
    #[error("recognition aborted")]
    Aborted,

    #[error("no speech detected")]
    NoSpeech,

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("processing failed: {0}")]
    Backend(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}
