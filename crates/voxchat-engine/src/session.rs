use std::time::Duration;
use voxchat_core::config::SessionTimingConfig;
use voxchat_core::{RecognizerError, RecognizerEvent, SessionPhase};

/// Side effects requested by the state machine. The caller (the session
/// driver) owns the engine, the audio source, and the timers; the machine
/// itself never blocks and never touches I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    StartEngine,
    StopEngine,
    /// Arm the single restart timer. Always preceded by cancellation of any
    /// pending timer; two timers must never be armed at once.
    ScheduleRestart { delay: Duration },
    CancelRestart,
    ClearError,
    SurfaceError(String),
    /// The user's stop completed. Hand the captured audio and the
    /// accumulated transcript downstream.
    FinishRecording,
}

/// Pure state machine for one speech capture session.
///
/// Tracks the recognizer lifecycle (`Idle → Listening → Stopping → Idle`)
/// together with a parallel recording flag: the recognizer may bounce
/// through restarts mid-recording while the raw-audio capture keeps running.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    recording: bool,
    transcript: String,
    interim: String,
    retry_count: u32,
    /// Set when the recognizer has been given up on for this session. The
    /// raw-audio capture keeps running until the user stops.
    halted: bool,
    restart_delay: Duration,
    settle_delay: Duration,
    retry_base: Duration,
    max_retries: u32,
}

impl SessionState {
    pub fn new(timing: &SessionTimingConfig) -> Self {
        Self {
            phase: SessionPhase::Idle,
            recording: false,
            transcript: String::new(),
            interim: String::new(),
            retry_count: 0,
            halted: false,
            restart_delay: Duration::from_millis(timing.restart_delay_ms),
            settle_delay: Duration::from_millis(timing.settle_delay_ms),
            retry_base: Duration::from_millis(timing.retry_base_ms),
            max_retries: timing.max_retries,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// User pressed record. Buffers, error state and the retry counter are
    /// reset; a live recognizer is bounced with a short settle delay before
    /// the fresh start.
    pub fn begin_recording(&mut self) -> Vec<SessionEffect> {
        self.transcript.clear();
        self.interim.clear();
        self.retry_count = 0;
        self.halted = false;
        self.recording = true;

        if self.phase == SessionPhase::Listening {
            return vec![
                SessionEffect::ClearError,
                SessionEffect::CancelRestart,
                SessionEffect::StopEngine,
                SessionEffect::ScheduleRestart {
                    delay: self.settle_delay,
                },
            ];
        }

        vec![
            SessionEffect::ClearError,
            SessionEffect::CancelRestart,
            SessionEffect::StartEngine,
        ]
    }

    /// User released record. Marks the stop as intentional so the engine's
    /// end event finishes the recording instead of scheduling a restart.
    pub fn end_recording(&mut self) -> Vec<SessionEffect> {
        if !self.recording {
            return Vec::new();
        }
        self.recording = false;

        match self.phase {
            SessionPhase::Listening => {
                self.phase = SessionPhase::Stopping;
                vec![SessionEffect::CancelRestart, SessionEffect::StopEngine]
            }
            // Engine already down (restart was pending); finish immediately.
            SessionPhase::Idle => {
                vec![SessionEffect::CancelRestart, SessionEffect::FinishRecording]
            }
            SessionPhase::Stopping => vec![SessionEffect::CancelRestart],
        }
    }

    /// The restart timer fired. Guarded: a stop that raced the timer wins.
    pub fn restart_fired(&mut self) -> Vec<SessionEffect> {
        if self.recording && self.phase != SessionPhase::Listening {
            vec![SessionEffect::StartEngine]
        } else {
            Vec::new()
        }
    }

    pub fn on_event(&mut self, event: RecognizerEvent) -> Vec<SessionEffect> {
        match event {
            RecognizerEvent::Started => {
                self.phase = SessionPhase::Listening;
                self.retry_count = 0;
                vec![SessionEffect::ClearError]
            }
            RecognizerEvent::Result { segments } => {
                self.interim.clear();
                for segment in segments {
                    if segment.is_final {
                        self.transcript.push_str(&segment.text);
                    } else {
                        self.interim.push_str(&segment.text);
                    }
                }
                Vec::new()
            }
            RecognizerEvent::Error(err) => self.on_error(err),
            RecognizerEvent::Ended => self.on_ended(),
        }
    }

    fn on_error(&mut self, err: RecognizerError) -> Vec<SessionEffect> {
        match err {
            // Benign: raised by intentional stops and silent stretches.
            RecognizerError::Aborted | RecognizerError::NoSpeech => Vec::new(),
            RecognizerError::Network(_) => {
                if !self.recording {
                    return Vec::new();
                }
                self.retry_count += 1;
                if self.retry_count < self.max_retries {
                    // Drop out of Listening so the fired timer restarts the
                    // engine instead of being ignored.
                    self.phase = SessionPhase::Idle;
                    let delay = self.retry_base * self.retry_count;
                    tracing::warn!(
                        attempt = self.retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "network error, scheduling recognizer retry"
                    );
                    vec![
                        SessionEffect::CancelRestart,
                        SessionEffect::ScheduleRestart { delay },
                    ]
                } else {
                    // Give up on recognition but keep the capture alive; the
                    // user's stop still packages the samples and transcript.
                    self.retry_count = 0;
                    self.halted = true;
                    self.phase = SessionPhase::Idle;
                    vec![
                        SessionEffect::CancelRestart,
                        SessionEffect::StopEngine,
                        SessionEffect::SurfaceError(
                            "network error: speech recognition unavailable".to_string(),
                        ),
                    ]
                }
            }
            RecognizerError::Other(msg) => {
                self.halted = true;
                self.phase = SessionPhase::Idle;
                vec![
                    SessionEffect::CancelRestart,
                    SessionEffect::StopEngine,
                    SessionEffect::SurfaceError(msg),
                ]
            }
        }
    }

    fn on_ended(&mut self) -> Vec<SessionEffect> {
        // A recording begun while the engine was still winding down takes
        // precedence over the old session's finish.
        if self.recording {
            self.phase = SessionPhase::Idle;
            if self.halted {
                return Vec::new();
            }
            if self.retry_count > 0 {
                // A backoff timer is armed; it must not be replaced by the
                // short restart delay.
                return Vec::new();
            }
            return vec![
                SessionEffect::CancelRestart,
                SessionEffect::ScheduleRestart {
                    delay: self.restart_delay,
                },
            ];
        }
        match self.phase {
            SessionPhase::Stopping => {
                self.phase = SessionPhase::Idle;
                self.interim.clear();
                vec![SessionEffect::FinishRecording]
            }
            _ => {
                self.phase = SessionPhase::Idle;
                Vec::new()
            }
        }
    }
}
