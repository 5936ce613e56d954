pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod search;
pub mod session;

pub use api::{
    AudioPayload, HealthStatus, HttpTranslationApi, Message, Role, Summary, Translation,
    TranslationApi,
};
pub use capture::{
    AudioChunk, CancelFlag, CaptureController, CaptureState, CpalMicrophone, MicrophoneBackend,
    MicrophoneConfig,
};
pub use config::Config;
pub use error::{Error, Result};
pub use search::MessageView;
pub use session::{SessionConfig, SessionEvent, SessionStore};
