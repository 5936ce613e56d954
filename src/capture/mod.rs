//! Microphone capture pipeline
//!
//! This module provides the capture state machine and device access:
//! - `CaptureController`: one capture from start to send/cancel
//! - `MicrophoneBackend`: exclusive device access behind a trait
//! - `CpalMicrophone`: cpal-based implementation
//!
//! The one hard resource-safety invariant lives here: the microphone is held
//! by at most one capture at a time and is released on every exit path.

mod backend;
mod controller;
mod microphone;

pub use backend::{AudioChunk, MicrophoneBackend, MicrophoneConfig};
pub use controller::{CancelFlag, CaptureController, CaptureState};
pub use microphone::CpalMicrophone;
