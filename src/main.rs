use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use voxchat_audio::{decode_wav, encode_wav, Amplitude, MicSource, Player};
use voxchat_client::{ProcessedReply, SpeechClient};
use voxchat_core::{AppConfig, ChatMessage, ChatState, ClientError, UiCommand};
use voxchat_engine::{DriverCommand, DriverHandle, EngineRegistry, SessionDriver};

#[derive(Parser)]
#[command(name = "voxchat", about = "Push-to-talk voice chat client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

/// Internal events feeding the orchestrator loop.
enum OrchEvent {
    Reply(Result<ProcessedReply, ClientError>),
    PlaybackStarted,
    PlaybackEnded,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::load_from_file(&cli.config)
            .with_context(|| format!("failed to load config from {:?}", cli.config))?
    } else {
        AppConfig::default()
    };

    // TUI log buffer plus layered tracing subscriber
    let (tui_log_layer, log_buffer) = voxchat_tui::TuiLogLayer::with_capacity(1000);

    let env_filter =
        EnvFilter::try_new(&config.general.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tui_log_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("voxchat starting, backend {}", config.server.base_url);

    let sample_rate = config.general.sample_rate;
    let buffer_size = config.general.buffer_size;

    // Recognizer engine from config
    let registry = EngineRegistry::new();
    let mut engine = registry
        .create(&config.recognizer.engine)
        .with_context(|| format!("unknown recognizer engine '{}'", config.recognizer.engine))?;
    let engine_config = match config.recognizer.whisper {
        Some(ref whisper_cfg) => {
            toml::Value::try_from(whisper_cfg).context("failed to serialize whisper config")?
        }
        None => toml::Value::Table(Default::default()),
    };
    engine
        .initialize(engine_config)
        .await
        .with_context(|| format!("failed to initialize engine '{}'", config.recognizer.engine))?;
    tracing::info!("recognizer engine '{}' active", config.recognizer.engine);

    let mic = MicSource::new(&config.audio.input_device, sample_rate, 1, buffer_size);
    let (driver, driver_handle) = SessionDriver::new(engine, Box::new(mic), &config.session);
    let driver_task = driver.spawn();

    let client = Arc::new(SpeechClient::new(&config.server.base_url));
    let player = Arc::new(Player::new(&config.audio.output_device, buffer_size));
    let amplitude = Amplitude::new();

    let (state_tx, state_rx) = watch::channel(ChatState::default());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let orchestrator = tokio::spawn(orchestrate(
        driver_handle,
        cmd_rx,
        state_tx,
        client,
        player,
        amplitude,
        config.audio.muted,
        sample_rate,
    ));

    tracing::info!("TUI active, press 'q' to quit");

    // Blocks until the user quits
    voxchat_tui::run(state_rx, cmd_tx, log_buffer)
        .await
        .context("TUI error")?;

    tracing::info!("shutting down");
    let _ = orchestrator.await;
    let _ = driver_task.await;

    Ok(())
}

/// Owns the chat history and presentation flags, and mediates between the
/// TUI, the capture session driver, and the backend client.
#[allow(clippy::too_many_arguments)]
async fn orchestrate(
    mut driver: DriverHandle,
    mut cmd_rx: mpsc::UnboundedReceiver<UiCommand>,
    state_tx: watch::Sender<ChatState>,
    client: Arc<SpeechClient>,
    player: Arc<Player>,
    amplitude: Amplitude,
    muted_at_start: bool,
    sample_rate: u32,
) {
    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut is_processing = false;
    let mut is_playing = false;
    let mut muted = muted_at_start;
    let mut error: Option<String> = None;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<OrchEvent>();
    let mut tick = tokio::time::interval(Duration::from_millis(33));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::ToggleRecording) => {
                        let recording = driver.snapshots.borrow().recording;
                        let command = if recording {
                            DriverCommand::StopRecording
                        } else {
                            DriverCommand::StartRecording
                        };
                        let _ = driver.commands.send(command);
                    }
                    Some(UiCommand::ToggleMute) => {
                        muted = !muted;
                        tracing::debug!(muted, "mute toggled");
                    }
                    Some(UiCommand::Quit) | None => {
                        let _ = driver.commands.send(DriverCommand::Shutdown);
                        break;
                    }
                }
            }
            Some(output) = driver.outputs.recv() => {
                match output {
                    voxchat_engine::DriverOutput::ClearError => error = None,
                    voxchat_engine::DriverOutput::Error(msg) => error = Some(msg),
                    voxchat_engine::DriverOutput::Finished { samples, sample_rate: rate, transcript } => {
                        if samples.is_empty() {
                            tracing::debug!("discarding empty recording");
                            continue;
                        }
                        let rate = if rate > 0 { rate } else { sample_rate };
                        messages.push(ChatMessage::user(transcript.clone(), None));
                        is_processing = true;
                        spawn_processing(
                            Arc::clone(&client),
                            event_tx.clone(),
                            samples,
                            rate,
                            transcript,
                        );
                    }
                }
            }
            Some(event) = event_rx.recv() => {
                match event {
                    OrchEvent::Reply(Ok(reply)) => {
                        is_processing = false;
                        messages.push(ChatMessage::ai(reply.text, reply.audio_url.clone()));
                        if let Some(url) = reply.audio_url {
                            if !muted {
                                spawn_playback(
                                    Arc::clone(&client),
                                    Arc::clone(&player),
                                    amplitude.clone(),
                                    event_tx.clone(),
                                    url,
                                );
                            }
                        }
                    }
                    OrchEvent::Reply(Err(e)) => {
                        is_processing = false;
                        error = Some(e.to_string());
                    }
                    OrchEvent::PlaybackStarted => is_playing = true,
                    OrchEvent::PlaybackEnded => is_playing = false,
                }
            }
            _ = tick.tick() => {
                let snapshot = driver.snapshots.borrow().clone();
                let state = ChatState {
                    messages: messages.clone(),
                    phase: snapshot.phase,
                    transcript: snapshot.transcript,
                    interim: snapshot.interim,
                    is_processing,
                    is_playing,
                    muted,
                    amplitude: amplitude.get(),
                    error: error.clone(),
                };
                state_tx.send_if_modified(|current| {
                    if *current != state {
                        *current = state;
                        true
                    } else {
                        false
                    }
                });
            }
        }
    }
}

/// Encode the capture as WAV and post it with the transcript.
fn spawn_processing(
    client: Arc<SpeechClient>,
    event_tx: mpsc::UnboundedSender<OrchEvent>,
    samples: Vec<f32>,
    sample_rate: u32,
    transcript: String,
) {
    tokio::spawn(async move {
        let result = match encode_wav(&samples, sample_rate, 1) {
            Ok(wav) => {
                let mut result = client.process_audio(wav, &transcript).await;
                // Reply text without audio: ask for synthesis, degrade quietly
                if let Ok(ref mut reply) = result {
                    if reply.audio_url.is_none() {
                        if let Some(ref text) = reply.text {
                            reply.audio_url = client.generate_tts(text).await;
                        }
                    }
                }
                result
            }
            Err(e) => Err(ClientError::Request(e.to_string())),
        };
        let _ = event_tx.send(OrchEvent::Reply(result));
    });
}

/// Download and play a reply clip, driving the shared amplitude scale.
fn spawn_playback(
    client: Arc<SpeechClient>,
    player: Arc<Player>,
    amplitude: Amplitude,
    event_tx: mpsc::UnboundedSender<OrchEvent>,
    url: String,
) {
    tokio::spawn(async move {
        let bytes = match client.fetch_audio(&url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to fetch reply audio");
                return;
            }
        };
        let chunk = match decode_wav(&bytes) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to decode reply audio");
                return;
            }
        };

        let handle = match player.play(chunk, amplitude) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "playback failed to start");
                return;
            }
        };
        let _ = event_tx.send(OrchEvent::PlaybackStarted);
        let _ = tokio::task::spawn_blocking(move || handle.wait()).await;
        let _ = event_tx.send(OrchEvent::PlaybackEnded);
    });
}
