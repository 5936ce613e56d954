use tokio::sync::mpsc;

use crate::error::Result;

/// A block of captured PCM audio (16-bit, interleaved).
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw samples (i16 PCM, interleaved).
    pub samples: Vec<i16>,
    /// Effective sample rate the device delivered, in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Milliseconds since capture started.
    pub timestamp_ms: u64,
}

/// Microphone configuration.
#[derive(Debug, Clone)]
pub struct MicrophoneConfig {
    /// Named input device; `None` selects the system default.
    pub device: Option<String>,
    /// Requested sample rate (the device may deliver a different one,
    /// reported per chunk).
    pub sample_rate: u32,
    /// Requested channel count.
    pub channels: u16,
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Exclusive microphone access.
///
/// `open` acquires the device and returns a channel of captured chunks;
/// `close` releases it. Implementations must also release the device when
/// dropped so forced teardown can never leak it. Acquisition failure maps to
/// [`crate::Error::DeviceUnavailable`].
#[async_trait::async_trait]
pub trait MicrophoneBackend: Send {
    /// Acquire the device and start capturing.
    async fn open(&mut self) -> Result<mpsc::Receiver<AudioChunk>>;

    /// Stop capturing and release the device. Idempotent.
    async fn close(&mut self) -> Result<()>;

    /// Whether the device is currently held.
    fn is_open(&self) -> bool;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
