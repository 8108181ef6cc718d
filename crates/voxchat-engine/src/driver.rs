use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use voxchat_core::config::SessionTimingConfig;
use voxchat_core::{AudioChunk, AudioSource, RecognizerEvent, SessionPhase};

use crate::recognizer::SpeechRecognizer;
use crate::session::{SessionEffect, SessionState};

/// Commands into the driver, from the UI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    StartRecording,
    StopRecording,
    Shutdown,
}

/// Outputs from the driver, consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutput {
    /// A recording completed. Carries the raw capture and the transcript
    /// accumulated across any engine restarts within the session.
    Finished {
        samples: Vec<f32>,
        sample_rate: u32,
        transcript: String,
    },
    Error(String),
    ClearError,
}

/// Live view of the session, broadcast on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub recording: bool,
    pub transcript: String,
    pub interim: String,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            recording: false,
            transcript: String::new(),
            interim: String::new(),
        }
    }
}

pub struct DriverHandle {
    pub commands: mpsc::UnboundedSender<DriverCommand>,
    pub outputs: mpsc::UnboundedReceiver<DriverOutput>,
    pub snapshots: watch::Receiver<SessionSnapshot>,
}

/// Owns the recognizer, the audio source, and the single restart timer, and
/// translates [`SessionState`] effects into engine calls. All timer handles
/// are tracked and aborted on cancellation so no two restarts can race.
pub struct SessionDriver {
    engine: Box<dyn SpeechRecognizer>,
    source: Box<dyn AudioSource>,
    state: SessionState,
    command_rx: mpsc::UnboundedReceiver<DriverCommand>,
    output_tx: mpsc::UnboundedSender<DriverOutput>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    event_rx: mpsc::UnboundedReceiver<RecognizerEvent>,
    audio_tx: mpsc::UnboundedSender<AudioChunk>,
    audio_rx: mpsc::UnboundedReceiver<AudioChunk>,
    timer_tx: mpsc::UnboundedSender<()>,
    timer_rx: mpsc::UnboundedReceiver<()>,
    restart_task: Option<JoinHandle<()>>,
    samples: Vec<f32>,
    sample_rate: u32,
    capturing: bool,
}

impl SessionDriver {
    pub fn new(
        mut engine: Box<dyn SpeechRecognizer>,
        source: Box<dyn AudioSource>,
        timing: &SessionTimingConfig,
    ) -> (Self, DriverHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        engine.set_event_sender(event_tx);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let driver = Self {
            engine,
            source,
            state: SessionState::new(timing),
            command_rx,
            output_tx,
            snapshot_tx,
            event_rx,
            audio_tx,
            audio_rx,
            timer_tx,
            timer_rx,
            restart_task: None,
            samples: Vec::new(),
            sample_rate: 0,
            capturing: false,
        };
        let handle = DriverHandle {
            commands: command_tx,
            outputs: output_rx,
            snapshots: snapshot_rx,
        };
        (driver, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(DriverCommand::StartRecording) => self.handle_start().await,
                        Some(DriverCommand::StopRecording) => {
                            let effects = self.state.end_recording();
                            self.apply_effects(effects).await;
                        }
                        Some(DriverCommand::Shutdown) | None => break,
                    }
                }
                Some(event) = self.event_rx.recv() => {
                    let effects = self.state.on_event(event);
                    self.apply_effects(effects).await;
                }
                Some(chunk) = self.audio_rx.recv() => {
                    if self.capturing {
                        self.sample_rate = chunk.sample_rate;
                        self.samples.extend_from_slice(&chunk.samples);
                        if let Err(e) = self.engine.feed_audio(chunk).await {
                            tracing::error!("engine feed error: {e}");
                        }
                    }
                }
                Some(()) = self.timer_rx.recv() => {
                    let effects = self.state.restart_fired();
                    self.apply_effects(effects).await;
                }
            }
            self.publish_snapshot();
        }
        self.cancel_restart();
        self.source.stop();
        if let Err(e) = self.engine.shutdown().await {
            tracing::error!("engine shutdown error: {e}");
        }
        tracing::debug!("session driver stopped");
    }

    async fn handle_start(&mut self) {
        if !self.capturing {
            self.samples.clear();
            if let Err(e) = self.source.start(self.audio_tx.clone()) {
                tracing::error!("failed to start audio capture: {e}");
                let _ = self.output_tx.send(DriverOutput::Error(e.to_string()));
                return;
            }
            self.capturing = true;
        }
        let effects = self.state.begin_recording();
        self.apply_effects(effects).await;
    }

    async fn apply_effects(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::StartEngine => {
                    if let Err(e) = self.engine.start().await {
                        tracing::error!("engine start error: {e}");
                        let _ = self.output_tx.send(DriverOutput::Error(e.to_string()));
                    }
                }
                SessionEffect::StopEngine => {
                    if let Err(e) = self.engine.stop().await {
                        tracing::error!("engine stop error: {e}");
                    }
                }
                SessionEffect::ScheduleRestart { delay } => {
                    self.cancel_restart();
                    let timer_tx = self.timer_tx.clone();
                    self.restart_task = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = timer_tx.send(());
                    }));
                }
                SessionEffect::CancelRestart => self.cancel_restart(),
                SessionEffect::ClearError => {
                    let _ = self.output_tx.send(DriverOutput::ClearError);
                }
                SessionEffect::SurfaceError(msg) => {
                    // Capture keeps running; a later stop still packages the
                    // take even with the recognizer down.
                    let _ = self.output_tx.send(DriverOutput::Error(msg));
                }
                SessionEffect::FinishRecording => {
                    self.stop_capture();
                    let samples = std::mem::take(&mut self.samples);
                    let _ = self.output_tx.send(DriverOutput::Finished {
                        samples,
                        sample_rate: self.sample_rate,
                        transcript: self.state.transcript().to_string(),
                    });
                }
            }
        }
    }

    fn stop_capture(&mut self) {
        if self.capturing {
            self.source.stop();
            self.capturing = false;
        }
    }

    fn cancel_restart(&mut self) {
        if let Some(task) = self.restart_task.take() {
            task.abort();
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = SessionSnapshot {
            phase: self.state.phase(),
            recording: self.state.is_recording(),
            transcript: self.state.transcript().to_string(),
            interim: self.state.interim().to_string(),
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }
}
