use super::*;
use time::macros::{datetime, offset};

fn msg(role: Role, content: &str) -> ChatMessage {
    ChatMessage { role, content: content.into(), id: None, timestamp: Some(datetime!(2026-03-01 14:05 UTC)) }
}

fn renderer(theme: Theme) -> Renderer {
    Renderer::new(theme, UtcOffset::UTC, "Gemini 2.5")
}

// =========================================================================
// format_time
// =========================================================================

#[test]
fn format_time_uses_twelve_hour_clock() {
    assert_eq!(format_time(Some(datetime!(2026-03-01 14:05 UTC)), UtcOffset::UTC), "02:05 PM");
    assert_eq!(format_time(Some(datetime!(2026-03-01 09:30 UTC)), UtcOffset::UTC), "09:30 AM");
}

#[test]
fn format_time_applies_offset() {
    let ts = datetime!(2026-03-01 14:05 UTC);
    assert_eq!(format_time(Some(ts), offset!(-5)), "09:05 AM");
}

#[test]
fn format_time_midnight_is_twelve_am() {
    assert_eq!(format_time(Some(datetime!(2026-03-01 00:15 UTC)), UtcOffset::UTC), "12:15 AM");
}

#[test]
fn format_time_missing_is_empty() {
    assert_eq!(format_time(None, UtcOffset::UTC), "");
}

// =========================================================================
// Theme
// =========================================================================

#[test]
fn theme_toggles_both_ways() {
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
    assert!(Theme::from_dark(true).is_dark());
    assert!(!Theme::default().is_dark());
}

// =========================================================================
// Renderer
// =========================================================================

#[test]
fn header_names_model_and_mode() {
    let out = renderer(Theme::Dark).header();
    assert!(out.contains(TITLE));
    assert!(out.contains("Powered by Gemini 2.5"));
    assert!(out.contains("dark mode"));
}

#[test]
fn empty_transcript_shows_suggestions() {
    let out = renderer(Theme::Light).transcript(&[], None);
    assert!(out.contains(EMPTY_HEADLINE));
    for prompt in &SUGGESTED_PROMPTS {
        assert!(out.contains(prompt.text));
        assert!(out.contains(&format!("[{}]", prompt.category)));
    }
}

#[test]
fn transcript_numbers_messages_with_time() {
    let messages = [msg(Role::User, "Hello"), msg(Role::Assistant, "Hi!\nHow can I help?")];
    let out = renderer(Theme::Light).transcript(&messages, None);

    assert!(out.contains("#1"));
    assert!(out.contains("You"));
    assert!(out.contains("#2"));
    assert!(out.contains("Assistant"));
    assert!(out.contains("How can I help?"));
    assert!(out.contains("02:05 PM"));
    assert!(!out.contains(EMPTY_HEADLINE));
    assert!(!out.contains("Copied"));
}

#[test]
fn copied_marker_only_on_marked_message() {
    let r = renderer(Theme::Light);
    let marked = r.message(2, &msg(Role::Assistant, "reply"), true);
    let plain = r.message(1, &msg(Role::User, "ask"), false);
    assert!(marked.contains("Copied"));
    assert!(!plain.contains("Copied"));
}

#[test]
fn thinking_and_footer_text() {
    let r = renderer(Theme::Dark);
    assert!(r.thinking().contains(THINKING));
    assert!(r.footer().contains(DISCLAIMER));
}
