// Capture state-machine tests against a scripted microphone backend.
//
// The backend double counts device acquisitions and releases so the one hard
// resource-safety invariant (release on every exit path) is checked directly.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use consult_bridge::{
    AudioChunk, CaptureController, CaptureState, Error, MicrophoneBackend, Result,
};
use tokio::sync::mpsc;

struct ScriptedMicrophone {
    chunks: Vec<AudioChunk>,
    fail_open: bool,
    open: bool,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

#[derive(Clone)]
struct DeviceProbe {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl ScriptedMicrophone {
    fn new(chunks: Vec<AudioChunk>) -> (Self, DeviceProbe) {
        let probe = DeviceProbe {
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(true)),
        };
        let backend = Self {
            chunks,
            fail_open: false,
            open: false,
            opens: Arc::clone(&probe.opens),
            closes: Arc::clone(&probe.closes),
            released: Arc::clone(&probe.released),
        };
        (backend, probe)
    }

    fn failing() -> (Self, DeviceProbe) {
        let (mut backend, probe) = Self::new(Vec::new());
        backend.fail_open = true;
        (backend, probe)
    }
}

#[async_trait::async_trait]
impl MicrophoneBackend for ScriptedMicrophone {
    async fn open(&mut self) -> Result<mpsc::Receiver<AudioChunk>> {
        if self.fail_open {
            return Err(Error::DeviceUnavailable("permission denied".to_string()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.released.store(false, Ordering::SeqCst);
        self.open = true;

        let (tx, rx) = mpsc::channel(self.chunks.len().max(1));
        for chunk in self.chunks.drain(..) {
            tx.send(chunk).await.expect("scripted channel full");
        }
        // Dropping the sender ends the stream once the chunks are drained.
        Ok(rx)
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.open = false;
        }
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl Drop for ScriptedMicrophone {
    fn drop(&mut self) {
        if self.open {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        self.released.store(true, Ordering::SeqCst);
    }
}

fn pcm(samples: Vec<i16>, timestamp_ms: u64) -> AudioChunk {
    AudioChunk {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

#[tokio::test]
async fn test_start_stop_send_yields_one_payload() {
    let (backend, probe) = ScriptedMicrophone::new(vec![
        pcm(vec![1, 2, 3], 0),
        pcm(vec![4, 5], 100),
    ]);
    let mut controller = CaptureController::new(Box::new(backend));

    controller.start().await.unwrap();
    assert_eq!(controller.state(), CaptureState::Recording);

    controller.stop().await.unwrap();
    assert_eq!(controller.state(), CaptureState::Captured);
    assert!(probe.released.load(Ordering::SeqCst));

    let payload = controller.send().unwrap();
    assert_eq!(controller.state(), CaptureState::Ended);
    assert_eq!(payload.content_type, "audio/wav");
    assert_eq!(&payload.bytes[..4], b"RIFF");

    // The payload is a playable WAV carrying every captured sample.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.wav");
    std::fs::write(&path, &payload.bytes).unwrap();
    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 5);

    // The payload is yielded exactly once.
    assert!(controller.send().is_err());
    assert_eq!(probe.opens.load(Ordering::SeqCst), 1);
    assert_eq!(probe.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_without_stop_releases_device_and_yields_nothing() {
    let (backend, probe) = ScriptedMicrophone::new(vec![pcm(vec![1], 0)]);
    let mut controller = CaptureController::new(Box::new(backend));

    controller.start().await.unwrap();
    controller.cancel().await;

    assert_eq!(controller.state(), CaptureState::Ended);
    assert!(controller.send().is_err());
    assert!(probe.released.load(Ordering::SeqCst));
    assert_eq!(
        probe.opens.load(Ordering::SeqCst),
        probe.closes.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_cancel_from_captured_discards_payload() {
    let (backend, probe) = ScriptedMicrophone::new(vec![pcm(vec![7], 0)]);
    let mut controller = CaptureController::new(Box::new(backend));

    controller.start().await.unwrap();
    controller.stop().await.unwrap();
    controller.cancel().await;

    assert_eq!(controller.state(), CaptureState::Ended);
    assert!(controller.send().is_err());
    assert!(probe.released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_device_unavailable_fails_capture() {
    let (backend, probe) = ScriptedMicrophone::failing();
    let mut controller = CaptureController::new(Box::new(backend));

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable(_)));
    assert_eq!(controller.state(), CaptureState::Failed);
    assert!(probe.released.load(Ordering::SeqCst));

    // No transition is valid from Failed.
    assert!(controller.start().await.is_err());
    assert!(controller.send().is_err());
}

#[tokio::test]
async fn test_cancel_flag_raised_before_acquisition_resolves() {
    let (backend, probe) = ScriptedMicrophone::new(vec![pcm(vec![1], 0)]);
    let mut controller = CaptureController::new(Box::new(backend));

    // Teardown raced ahead of start(): the device must still be released
    // when acquisition resolves.
    controller.cancel_flag().cancel();
    controller.start().await.unwrap();

    assert_eq!(controller.state(), CaptureState::Ended);
    assert!(probe.released.load(Ordering::SeqCst));
    assert_eq!(
        probe.opens.load(Ordering::SeqCst),
        probe.closes.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_drop_while_recording_releases_device() {
    let (backend, probe) = ScriptedMicrophone::new(vec![pcm(vec![1], 0)]);
    let mut controller = CaptureController::new(Box::new(backend));

    controller.start().await.unwrap();
    assert!(!probe.released.load(Ordering::SeqCst));

    drop(controller);
    assert!(probe.released.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_counter_ticks_once_per_second() {
    let (backend, _probe) = ScriptedMicrophone::new(vec![pcm(vec![1], 0)]);
    let mut controller = CaptureController::new(Box::new(backend));

    controller.start().await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(controller.elapsed_seconds(), 0);

    tokio::time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;
    assert!(controller.elapsed_seconds() >= 3);

    controller.cancel().await;
}

#[tokio::test]
async fn test_invalid_transitions_are_rejected() {
    let (backend, _probe) = ScriptedMicrophone::new(vec![pcm(vec![1], 0)]);
    let mut controller = CaptureController::new(Box::new(backend));

    // stop/send before start
    assert!(controller.stop().await.is_err());
    assert!(controller.send().is_err());

    controller.start().await.unwrap();
    // double start
    assert!(controller.start().await.is_err());

    controller.stop().await.unwrap();
    // double stop
    assert!(controller.stop().await.is_err());
}
