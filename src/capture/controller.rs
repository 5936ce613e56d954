use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{AudioChunk, MicrophoneBackend};
use crate::api::AudioPayload;
use crate::error::{Error, Result};

/// Capture lifecycle states.
///
/// No transition is valid out of `Failed` or `Ended`; re-capture requires a
/// new controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Captured,
    Failed,
    Ended,
}

/// Cooperative cancellation flag for an in-flight `start()`.
///
/// Cloneable so teardown code can request cancellation while device
/// acquisition is still suspended; the controller checks it when acquisition
/// resolves and releases the device immediately if set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns one microphone capture from start to send/cancel.
///
/// Drives the state machine
/// `Idle -> Recording -> Captured -> [ended]`, with `cancel()` reachable from
/// `Recording` and `Captured` and a `Failed` terminal state when the device
/// cannot be acquired. The device is released on every exit path: stop,
/// cancel, acquisition failure, cancelled-during-start, and drop (the backend
/// releases on drop as well).
pub struct CaptureController {
    backend: Box<dyn MicrophoneBackend>,
    state: CaptureState,
    cancel: CancelFlag,
    chunks: Arc<Mutex<Vec<AudioChunk>>>,
    elapsed: Arc<AtomicU64>,
    ticking: Arc<AtomicBool>,
    drain_task: Option<JoinHandle<()>>,
    timer_task: Option<JoinHandle<()>>,
    payload: Option<AudioPayload>,
}

impl CaptureController {
    pub fn new(backend: Box<dyn MicrophoneBackend>) -> Self {
        Self {
            backend,
            state: CaptureState::Idle,
            cancel: CancelFlag::default(),
            chunks: Arc::new(Mutex::new(Vec::new())),
            elapsed: Arc::new(AtomicU64::new(0)),
            ticking: Arc::new(AtomicBool::new(false)),
            drain_task: None,
            timer_task: None,
            payload: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Seconds spent recording so far (wall-clock, 1 Hz).
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// Handle for cancelling an in-flight `start()` from teardown code.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Idle -> Recording. Acquires the device; on failure the controller is
    /// `Failed` and must be abandoned. If the cancel flag was raised while
    /// acquisition was suspended, the device is released on resolution and
    /// the controller ends without recording.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != CaptureState::Idle {
            return Err(Error::Capture(format!(
                "start() is only valid from Idle (state: {:?})",
                self.state
            )));
        }

        let mut rx = match self.backend.open().await {
            Ok(rx) => rx,
            Err(e) => {
                self.state = CaptureState::Failed;
                return Err(e);
            }
        };

        if self.cancel.is_cancelled() {
            info!("Capture cancelled during device acquisition, releasing");
            let _ = self.backend.close().await;
            self.state = CaptureState::Ended;
            return Ok(());
        }

        info!("Recording started ({})", self.backend.name());
        self.state = CaptureState::Recording;

        let chunks = Arc::clone(&self.chunks);
        self.drain_task = Some(tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                chunks.lock().await.push(chunk);
            }
        }));

        self.ticking.store(true, Ordering::SeqCst);
        let ticking = Arc::clone(&self.ticking);
        let elapsed = Arc::clone(&self.elapsed);
        self.timer_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of an interval completes immediately.
            interval.tick().await;
            while ticking.load(Ordering::SeqCst) {
                interval.tick().await;
                if !ticking.load(Ordering::SeqCst) {
                    break;
                }
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));

        Ok(())
    }

    /// Recording -> Captured. Releases the device and finalizes the
    /// accumulated chunks into a single WAV payload.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != CaptureState::Recording {
            return Err(Error::Capture(format!(
                "stop() is only valid from Recording (state: {:?})",
                self.state
            )));
        }

        self.stop_timer();
        self.backend.close().await?;

        // The backend closed its sender; the drain task finishes on its own.
        if let Some(task) = self.drain_task.take() {
            if task.await.is_err() {
                warn!("Capture drain task panicked");
            }
        }

        let chunks = self.chunks.lock().await;
        let payload = finalize_wav(&chunks)?;
        info!(
            "Capture finalized: {} chunks, {} bytes, {}s",
            chunks.len(),
            payload.bytes.len(),
            self.elapsed_seconds()
        );
        drop(chunks);

        self.payload = Some(payload);
        self.state = CaptureState::Captured;
        Ok(())
    }

    /// Discard the capture. Valid from Recording or Captured, idempotent from
    /// anywhere else; always releases the device and runs to completion.
    pub async fn cancel(&mut self) {
        self.cancel.cancel();
        self.stop_timer();

        if let Some(task) = self.drain_task.take() {
            task.abort();
        }
        if self.backend.is_open() {
            if let Err(e) = self.backend.close().await {
                warn!("Failed to close microphone on cancel: {}", e);
            }
        }

        self.payload = None;
        if self.state != CaptureState::Ended {
            info!("Capture cancelled (was {:?})", self.state);
            self.state = CaptureState::Ended;
        }
    }

    /// Captured -> ended. Yields the payload exactly once.
    pub fn send(&mut self) -> Result<AudioPayload> {
        if self.state != CaptureState::Captured {
            return Err(Error::Capture(format!(
                "send() is only valid from Captured (state: {:?})",
                self.state
            )));
        }

        let payload = self
            .payload
            .take()
            .ok_or_else(|| Error::Capture("captured payload missing".to_string()))?;
        self.state = CaptureState::Ended;
        Ok(payload)
    }

    fn stop_timer(&mut self) {
        self.ticking.store(false, Ordering::SeqCst);
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.ticking.store(false, Ordering::SeqCst);
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
        if let Some(task) = self.drain_task.take() {
            task.abort();
        }
        // The backend's own Drop releases the device if still held.
    }
}

/// Encode accumulated PCM chunks as one WAV file in memory.
///
/// The effective sample rate and channel count are taken from the first
/// chunk; an empty capture still yields a valid (silent) file.
fn finalize_wav(chunks: &[AudioChunk]) -> Result<AudioPayload> {
    let (sample_rate, channels) = chunks
        .first()
        .map(|c| (c.sample_rate, c.channels))
        .unwrap_or((16000, 1));

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Capture(format!("WAV writer: {e}")))?;
        for chunk in chunks {
            for &sample in &chunk.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| Error::Capture(format!("WAV write: {e}")))?;
            }
        }
        writer
            .finalize()
            .map_err(|e| Error::Capture(format!("WAV finalize: {e}")))?;
    }

    Ok(AudioPayload::new(cursor.into_inner(), "audio/wav"))
}
