use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{AudioChunk, MicrophoneBackend, MicrophoneConfig};
use crate::error::{Error, Result};

/// cpal-based microphone backend.
///
/// The `cpal::Stream` is not `Send`, so the stream lives on a dedicated
/// capture thread for its whole lifetime. The thread reports acquisition
/// success or failure over a oneshot channel, then forwards converted PCM
/// chunks until the stop flag is set. Dropping the backend sets the stop flag
/// too, so the device is released even on forced teardown.
pub struct CpalMicrophone {
    config: MicrophoneConfig,
    stop: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    open: bool,
}

impl CpalMicrophone {
    pub fn new(config: MicrophoneConfig) -> Self {
        Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            open: false,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for CpalMicrophone {
    async fn open(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.open {
            return Err(Error::Capture("microphone already open".to_string()));
        }

        self.stop.store(false, Ordering::SeqCst);

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let stop = Arc::clone(&self.stop);
        let config = self.config.clone();

        let worker = std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || capture_worker(config, stop, chunk_tx, ready_tx))
            .map_err(|e| Error::Capture(format!("failed to spawn capture thread: {e}")))?;

        // Suspend until the device is acquired (or refused).
        match ready_rx.await {
            Ok(Ok(())) => {
                self.worker = Some(worker);
                self.open = true;
                Ok(chunk_rx)
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(Error::DeviceUnavailable(
                    "capture thread exited before acquiring the device".to_string(),
                ))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            // Joining a short-lived thread still counts as blocking.
            tokio::task::spawn_blocking(move || {
                if worker.join().is_err() {
                    error!("Capture thread panicked");
                }
            })
            .await
            .map_err(|e| Error::Capture(format!("failed to join capture thread: {e}")))?;
        }

        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "cpal-microphone"
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        // The capture thread observes the flag and drops the stream,
        // releasing the device even when close() was never awaited.
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn capture_worker(
    config: MicrophoneConfig,
    stop: Arc<AtomicBool>,
    chunk_tx: mpsc::Sender<AudioChunk>,
    ready_tx: oneshot::Sender<Result<()>>,
) {
    let host = cpal::default_host();

    let device = match &config.device {
        Some(name) => {
            let found = host
                .input_devices()
                .ok()
                .and_then(|mut devices| {
                    devices.find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                });
            match found {
                Some(device) => device,
                None => {
                    let _ = ready_tx.send(Err(Error::DeviceUnavailable(format!(
                        "input device '{name}' not found"
                    ))));
                    return;
                }
            }
        }
        None => match host.default_input_device() {
            Some(device) => device,
            None => {
                let _ = ready_tx.send(Err(Error::DeviceUnavailable(
                    "no default input device".to_string(),
                )));
                return;
            }
        },
    };

    let supported = match device.default_input_config() {
        Ok(supported) => supported,
        Err(e) => {
            let _ = ready_tx.send(Err(Error::DeviceUnavailable(format!(
                "no supported input config: {e}"
            ))));
            return;
        }
    };

    let sample_format = supported.sample_format();
    let started = Instant::now();

    // Try the requested rate/channel layout first; fall back to whatever the
    // device natively delivers. The effective values travel on every chunk.
    let requested = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let fallback = supported.config();

    info!(
        "Opening microphone '{}' (want {} Hz/{} ch, device default {} Hz/{} ch, {:?})",
        device.name().unwrap_or_else(|_| "unknown".to_string()),
        requested.sample_rate.0,
        requested.channels,
        fallback.sample_rate.0,
        fallback.channels,
        sample_format
    );

    let stream = match try_build(&device, sample_format, &requested, chunk_tx.clone(), started) {
        Ok(stream) => Ok(stream),
        Err(e) => {
            warn!("Requested stream config rejected ({}), using device default", e);
            try_build(&device, sample_format, &fallback, chunk_tx, started)
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(Error::DeviceUnavailable(format!(
            "failed to start input stream: {e}"
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    // Dropping the stream releases the device.
    drop(stream);
    info!("Microphone released");
}

fn try_build(
    device: &cpal::Device,
    sample_format: SampleFormat,
    config: &cpal::StreamConfig,
    chunk_tx: mpsc::Sender<AudioChunk>,
    started: Instant,
) -> Result<cpal::Stream> {
    match sample_format {
        SampleFormat::F32 => build_stream::<f32>(device, config, chunk_tx, started),
        SampleFormat::I16 => build_stream::<i16>(device, config, chunk_tx, started),
        SampleFormat::U16 => build_stream::<u16>(device, config, chunk_tx, started),
        other => Err(Error::DeviceUnavailable(format!(
            "unsupported sample format {other:?}"
        ))),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    chunk_tx: mpsc::Sender<AudioChunk>,
    started: Instant,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    let mut dropped = 0usize;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let chunk = AudioChunk {
                    samples: data.iter().map(|s| i16::from_sample_(*s)).collect(),
                    sample_rate,
                    channels,
                    timestamp_ms: started.elapsed().as_millis() as u64,
                };
                // Never block inside the audio callback; shed on backpressure.
                if chunk_tx.try_send(chunk).is_err() {
                    dropped += 1;
                    if dropped % 100 == 1 {
                        warn!("Capture channel full, dropped {} chunks", dropped);
                    }
                }
            },
            |err| error!("Input stream error: {}", err),
            None,
        )
        .map_err(|e| Error::DeviceUnavailable(format!("failed to open input stream: {e}")))
}
