use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use voxchat_core::{AudioChunk, AudioError, AudioSource};

use crate::device::DeviceManager;

const STATUS_OK: u8 = 0;
const STATUS_ERROR: u8 = 1;

// ── CaptureStatus ─────────────────────────────────────────────

/// Shared health flag for a live capture stream.
#[derive(Clone)]
pub struct CaptureStatus {
    inner: Arc<AtomicU8>,
}

impl CaptureStatus {
    fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(STATUS_OK)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.inner.load(Ordering::Relaxed) == STATUS_OK
    }

    fn set_error(&self) {
        self.inner.store(STATUS_ERROR, Ordering::Relaxed);
    }
}

// ── MicSource ─────────────────────────────────────────────────

struct CaptureWorker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Microphone input. The cpal stream is not `Send`, so it lives on a
/// dedicated thread that holds the device until [`MicSource::stop`].
pub struct MicSource {
    device_name: String,
    sample_rate: u32,
    channels: u16,
    buffer_size: u32,
    status: CaptureStatus,
    worker: Option<CaptureWorker>,
}

impl MicSource {
    pub fn new(device_name: &str, sample_rate: u32, channels: u16, buffer_size: u32) -> Self {
        Self {
            device_name: device_name.to_string(),
            sample_rate,
            channels,
            buffer_size,
            status: CaptureStatus::new(),
            worker: None,
        }
    }

    pub fn status(&self) -> CaptureStatus {
        self.status.clone()
    }
}

impl AudioSource for MicSource {
    fn start(&mut self, tap: mpsc::UnboundedSender<AudioChunk>) -> Result<(), AudioError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let device_name = self.device_name.clone();
        let sample_rate = self.sample_rate;
        let channels = self.channels;
        let buffer_size = self.buffer_size;
        let status = self.status.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        // The stream is built on the worker thread; its result is handed
        // back so a missing device fails the start call, not the session.
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), AudioError>>();

        let thread = std::thread::spawn(move || {
            let device = match DeviceManager::new().get_input_device(&device_name) {
                Ok(d) => d,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let config = StreamConfig {
                channels,
                sample_rate: SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Fixed(buffer_size),
            };

            let err_status = status.clone();
            let err_callback = move |err: cpal::StreamError| {
                tracing::error!("capture stream error: {}", err);
                err_status.set_error();
            };

            let stream = device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let chunk = AudioChunk {
                        samples: data.to_vec(),
                        sample_rate,
                        channels,
                    };
                    let _ = tap.send(chunk);
                },
                err_callback,
                None,
            );

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(AudioError::StreamBuild(e.to_string())));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::StreamBuild(e.to_string())));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while !stop_flag.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(10));
            }
            // Dropping the stream releases the device.
            drop(stream);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(CaptureWorker { stop, thread });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::CaptureUnavailable(
                    "capture thread exited before stream start".to_string(),
                ))
            }
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Relaxed);
            let _ = worker.thread.join();
        }
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_status_default_ok() {
        let status = CaptureStatus::new();
        assert!(status.is_ok());
    }

    #[test]
    fn test_capture_status_clone_shares_state() {
        let s1 = CaptureStatus::new();
        let s2 = s1.clone();
        s1.set_error();
        assert!(!s2.is_ok());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut source = MicSource::new("default", 16000, 1, 1024);
        source.stop();
        source.stop();
    }

    #[test]
    fn test_tap_dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel::<AudioChunk>();
        drop(rx);
        let chunk = AudioChunk {
            samples: vec![0.0; 480],
            sample_rate: 16000,
            channels: 1,
        };
        // `let _ = tx.send(...)` should not panic even with a dropped receiver
        let _ = tx.send(chunk);
    }

    #[test]
    #[ignore] // Requires audio hardware
    fn test_capture_from_default_device() {
        let (tx, mut rx) = mpsc::unbounded_channel::<AudioChunk>();
        let mut source = MicSource::new("default", 16000, 1, 1024);
        source.start(tx).unwrap();
        std::thread::sleep(Duration::from_millis(200));
        source.stop();
        let chunk = rx.try_recv().unwrap();
        assert!(!chunk.samples.is_empty());
    }
}
