// Wire-format tests for the backend message types.
//
// These verify the exact JSON contract the backend speaks: Mongo-style `_id`
// identifiers, optional fields, highlight snippets on search hits only, and
// the translation sentinel markers.

use consult_bridge::{Message, Role, Summary, Translation};

#[test]
fn test_message_deserializes_backend_json() {
    // A verbatim backend document; unknown fields must be ignored.
    let json = r#"{
        "_id": "665f1c2e9b1e8a0012a4d3f1",
        "original_text": "How are you feeling?",
        "translated_text": "¿Cómo te sientes?",
        "role": "doctor",
        "language": "en",
        "target_language": "es",
        "message_type": "text",
        "audio_url": null,
        "conversation_id": "default",
        "timestamp": "2024-01-01T00:00:00Z",
        "created_at": "2024-01-01T00:00:00Z"
    }"#;

    let message: Message = serde_json::from_str(json).unwrap();
    assert_eq!(message.id, "665f1c2e9b1e8a0012a4d3f1");
    assert_eq!(message.role, Role::Doctor);
    assert_eq!(message.original_text, "How are you feeling?");
    assert_eq!(message.translated_text.as_deref(), Some("¿Cómo te sientes?"));
    assert!(message.audio_url.is_none());
    assert!(message.highlight.is_none());
}

#[test]
fn test_voice_message_carries_audio_url() {
    let json = r#"{
        "_id": "m2",
        "original_text": "",
        "translated_text": "",
        "role": "patient",
        "audio_url": "https://cdn.example/recording.webm",
        "timestamp": "2024-01-01T00:00:05"
    }"#;

    let message: Message = serde_json::from_str(json).unwrap();
    assert_eq!(message.role, Role::Patient);
    // Transcription may be empty on a successful call.
    assert!(message.original_text.is_empty());
    assert_eq!(
        message.audio_url.as_deref(),
        Some("https://cdn.example/recording.webm")
    );
}

#[test]
fn test_search_hit_carries_highlight() {
    let json = r#"{
        "_id": "m3",
        "original_text": "I have had a fever since Monday",
        "translated_text": "Tengo fiebre desde el lunes",
        "role": "patient",
        "timestamp": "2024-01-01T00:01:00",
        "highlight": "...had a fever since..."
    }"#;

    let message: Message = serde_json::from_str(json).unwrap();
    assert_eq!(message.highlight.as_deref(), Some("...had a fever since..."));
}

#[test]
fn test_translation_ready() {
    let message = sample("Hello", Some("Hola"));
    assert_eq!(message.translation(), Translation::Ready("Hola"));
}

#[test]
fn test_translation_not_needed_when_texts_equal() {
    let message = sample("Hello", Some("Hello"));
    assert_eq!(message.translation(), Translation::NotNeeded);
}

#[test]
fn test_translation_missing_when_absent() {
    let message = sample("Hello", None);
    assert_eq!(message.translation(), Translation::Missing);
}

#[test]
fn test_translation_unavailable_sentinels() {
    // The sentinel prefixes the backend emits must never be mistaken for a
    // real translation.
    let disabled = sample(
        "Hello",
        Some("[Translation disabled - API key needed] Hello"),
    );
    assert_eq!(disabled.translation(), Translation::Unavailable);

    let failed = sample("Hello", Some("[Translation error] Hello"));
    assert_eq!(failed.translation(), Translation::Unavailable);

    let skipped = sample("Hello", Some("[Translation unavailable] Hello"));
    assert_eq!(skipped.translation(), Translation::Unavailable);
}

#[test]
fn test_timestamp_parsing_both_formats() {
    // RFC 3339 with timezone, and the backend's timezone-less isoformat.
    let with_tz = sample_at("2024-01-01T00:00:00Z");
    let naive = sample_at("2024-01-01T00:00:00.123456");

    assert!(with_tz.timestamp_utc().is_some());
    assert!(naive.timestamp_utc().is_some());
    assert!(with_tz.timestamp_utc() < naive.timestamp_utc());

    let garbage = sample_at("not-a-timestamp");
    assert!(garbage.timestamp_utc().is_none());
}

#[test]
fn test_role_wire_format() {
    assert_eq!(serde_json::to_string(&Role::Doctor).unwrap(), "\"doctor\"");
    assert_eq!(serde_json::to_string(&Role::Patient).unwrap(), "\"patient\"");
    assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
    assert!("nurse".parse::<Role>().is_err());
}

#[test]
fn test_summary_wire_format() {
    let json = r#"{
        "summary": "MEDICAL CONSULTATION SUMMARY\n\nSYMPTOMS:\nfever",
        "message_count": 12,
        "generated_at": "2024-01-01T01:00:00"
    }"#;

    let summary: Summary = serde_json::from_str(json).unwrap();
    assert!(summary.text.starts_with("MEDICAL CONSULTATION SUMMARY"));
    assert_eq!(summary.message_count, 12);
    assert_eq!(summary.generated_at, "2024-01-01T01:00:00");
}

fn sample(original: &str, translated: Option<&str>) -> Message {
    Message {
        id: "m1".to_string(),
        role: Role::Doctor,
        original_text: original.to_string(),
        translated_text: translated.map(str::to_string),
        audio_url: None,
        timestamp: "2024-01-01T00:00:00".to_string(),
        highlight: None,
    }
}

fn sample_at(timestamp: &str) -> Message {
    let mut message = sample("Hello", None);
    message.timestamp = timestamp.to_string();
    message
}
