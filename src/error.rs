use thiserror::Error;

/// Error taxonomy for the consultation client.
///
/// Device failures abandon capture (no retry); network/server failures are
/// surfaced as a one-shot notice with the pending flag cleared; translation
/// unavailability is NOT an error here — it is a sentinel on an otherwise
/// successful message (see [`crate::api::Translation`]).
#[derive(Debug, Error)]
pub enum Error {
    /// Microphone access was denied or no input device exists.
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// The HTTP exchange could not complete (DNS, connect, transport).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("server returned status {0}")]
    Server(u16),

    /// A 2xx response whose body could not be interpreted, or that carried
    /// `success: false`.
    #[error("invalid backend response: {0}")]
    Protocol(String),

    /// Invalid capture state transition or capture-pipeline failure.
    #[error("capture error: {0}")]
    Capture(String),

    /// Invalid session or client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
