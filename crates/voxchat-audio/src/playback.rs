use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use voxchat_core::{AudioChunk, AudioError};

use crate::amplitude::{Amplitude, AmplitudeAnalyzer};
use crate::device::DeviceManager;

// ── PlaybackHandle ────────────────────────────────────────────

pub struct PlaybackHandle {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    /// Cut playback short and release the device.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Block until playback drains. Intended for `spawn_blocking`.
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ── Player ────────────────────────────────────────────────────

/// One-shot audio playback. Each [`Player::play`] call spawns a worker
/// thread that owns the cpal output stream for the clip's duration and
/// drives the shared [`Amplitude`] from the samples actually rendered.
pub struct Player {
    device_name: String,
    buffer_size: u32,
}

impl Player {
    pub fn new(device_name: &str, buffer_size: u32) -> Self {
        Self {
            device_name: device_name.to_string(),
            buffer_size,
        }
    }

    pub fn play(
        &self,
        chunk: AudioChunk,
        amplitude: Amplitude,
    ) -> Result<PlaybackHandle, AudioError> {
        let device_name = self.device_name.clone();
        let buffer_size = self.buffer_size;
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let finished_flag = Arc::clone(&finished);

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), AudioError>>();

        let thread = std::thread::spawn(move || {
            let result = Self::run(
                &device_name,
                buffer_size,
                chunk,
                amplitude.clone(),
                &stop_flag,
                &ready_tx,
            );
            if let Err(e) = result {
                tracing::error!("playback failed: {}", e);
                let _ = ready_tx.send(Err(e));
            }
            amplitude.reset();
            finished_flag.store(true, Ordering::Relaxed);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(PlaybackHandle {
                stop,
                finished,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::StreamError(
                    "playback thread exited before stream start".to_string(),
                ))
            }
        }
    }

    fn run(
        device_name: &str,
        buffer_size: u32,
        chunk: AudioChunk,
        amplitude: Amplitude,
        stop: &Arc<AtomicBool>,
        ready_tx: &std::sync::mpsc::Sender<Result<(), AudioError>>,
    ) -> Result<(), AudioError> {
        let device = DeviceManager::new().get_output_device(device_name)?;

        let config = StreamConfig {
            channels: chunk.channels,
            sample_rate: SampleRate(chunk.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(buffer_size),
        };

        let total = chunk.samples.len();
        let (mut producer, consumer) = HeapRb::<f32>::new(total.max(1)).split();
        producer.push_slice(&chunk.samples);

        let consumer = Arc::new(Mutex::new(consumer));
        let rendered = Arc::new(AtomicUsize::new(0));
        let rendered_cb = Arc::clone(&rendered);
        let mut analyzer = AmplitudeAnalyzer::new(amplitude);

        let err_stop = Arc::clone(stop);
        let err_callback = move |err: cpal::StreamError| {
            tracing::error!("output stream error: {}", err);
            err_stop.store(true, Ordering::Relaxed);
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut popped = 0;
                    if let Ok(mut cons) = consumer.lock() {
                        for sample in data.iter_mut() {
                            match cons.try_pop() {
                                Some(s) => {
                                    *sample = s;
                                    popped += 1;
                                }
                                None => *sample = 0.0,
                            }
                        }
                    } else {
                        data.fill(0.0);
                    }
                    analyzer.feed(&data[..popped]);
                    rendered_cb.fetch_add(popped, Ordering::Relaxed);
                },
                err_callback,
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;
        let _ = ready_tx.send(Ok(()));

        while !stop.load(Ordering::Relaxed) && rendered.load(Ordering::Relaxed) < total {
            std::thread::sleep(Duration::from_millis(10));
        }
        drop(stream);
        Ok(())
    }
}
