use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use consult_bridge::{
    CaptureController, Config, CpalMicrophone, HttpTranslationApi, MicrophoneConfig, Role,
    SessionConfig, SessionStore, Translation, TranslationApi,
};
use tracing::info;

/// Bilingual consultation client (doctor-patient communication bridge).
#[derive(Debug, Parser)]
#[command(name = "consult-bridge", version)]
struct Args {
    /// Participant role: doctor or patient
    #[arg(long)]
    role: Role,

    /// Language this participant speaks (overrides config)
    #[arg(long)]
    source_language: Option<String>,

    /// Language the counterpart speaks (overrides config)
    #[arg(long)]
    target_language: Option<String>,

    /// Send one text message and print its translation
    #[arg(long)]
    text: Option<String>,

    /// Record this many seconds from the microphone and send as a voice
    /// message
    #[arg(long)]
    record_secs: Option<u64>,

    /// Config file path
    #[arg(long, default_value = "config/consult-bridge")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("consult-bridge v0.1.0");
    info!("Backend: {}", cfg.backend.base_url);

    let api = Arc::new(HttpTranslationApi::new(
        &cfg.backend.base_url,
        Duration::from_secs(cfg.backend.request_timeout_secs),
    ));

    let health = api.health().await?;
    info!("Backend health: {}", health.status);

    let source = args
        .source_language
        .unwrap_or(cfg.session.source_language);
    let target = args
        .target_language
        .unwrap_or(cfg.session.target_language);

    let mut session_config = SessionConfig::new(args.role, &source, &target)?;
    session_config.history_limit = cfg.session.history_limit;
    if let Some(id) = cfg.session.conversation_id {
        session_config = session_config.with_conversation(id);
    }

    let store = SessionStore::new(api, session_config);
    store.load_history().await?;

    let history = store.messages().await;
    println!("{} prior messages in this conversation", history.len());

    if let Some(text) = args.text {
        store.send_text(&text).await?;
        print_last_translation(&store).await;
    }

    if let Some(secs) = args.record_secs {
        let microphone = CpalMicrophone::new(MicrophoneConfig {
            device: cfg.audio.device,
            sample_rate: cfg.audio.sample_rate,
            channels: cfg.audio.channels,
        });
        let mut capture = CaptureController::new(Box::new(microphone));

        capture.start().await?;
        println!("Recording for {secs}s...");
        tokio::time::sleep(Duration::from_secs(secs)).await;
        capture.stop().await?;

        let payload = capture.send()?;
        store.send_audio(payload).await?;
        print_last_translation(&store).await;
    }

    Ok(())
}

async fn print_last_translation(store: &SessionStore) {
    if let Some(message) = store.messages().await.last() {
        if !message.original_text.is_empty() {
            println!("{}: {}", message.role, message.original_text);
        }
        match message.translation() {
            Translation::Ready(translated) => println!("-> {translated}"),
            Translation::NotNeeded => println!("-> (same language, no translation)"),
            Translation::Unavailable => println!("-> translation unavailable"),
            Translation::Missing => println!("-> translation pending"),
        }
    }
}
