// Projection-logic tests: the display list is the overlay or the canonical
// log, never a merge, and overlay order is preserved verbatim.

use consult_bridge::search::project;
use consult_bridge::{Message, Role};

fn msg(id: &str, timestamp: &str) -> Message {
    Message {
        id: id.to_string(),
        role: Role::Doctor,
        original_text: "text".to_string(),
        translated_text: None,
        audio_url: None,
        timestamp: timestamp.to_string(),
        highlight: None,
    }
}

#[test]
fn test_no_overlay_projects_canonical() {
    let canonical = vec![msg("m1", "2024-01-01T00:00:01"), msg("m2", "2024-01-01T00:00:02")];

    let view = project(&canonical, None);
    assert!(!view.is_search());
    let ids: Vec<_> = view.messages().iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, ["m1", "m2"]);
}

#[test]
fn test_overlay_order_is_preserved_not_resorted() {
    let canonical = vec![msg("m1", "2024-01-01T00:00:01"), msg("m2", "2024-01-01T00:00:02")];
    // Relevance order deliberately disagrees with chronology.
    let hits = vec![msg("m2", "2024-01-01T00:00:02"), msg("m1", "2024-01-01T00:00:01")];

    let view = project(&canonical, Some(&hits));
    assert!(view.is_search());
    let ids: Vec<_> = view.messages().iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, ["m2", "m1"]);
}

#[test]
fn test_empty_overlay_is_still_a_search_view() {
    let canonical = vec![msg("m1", "2024-01-01T00:00:01")];

    // Zero hits renders an empty result list, not the canonical log.
    let view = project(&canonical, Some(&[]));
    assert!(view.is_search());
    assert!(view.messages().is_empty());
}
