//! Extraction of a quiz from the provider's response envelope
//!
//! Model output is untrusted text: it may arrive inside markdown fences, with a
//! language tag, or with prose before and after the JSON object. Parsing is total
//! and reports every failure as a typed [`ParseError`].

use crate::error::ParseError;
use crate::protocol::GenerateResponse;
use crate::quiz::{QuizItem, QuizRecord};
use tracing::{debug, warn};

/// Characters of model output kept in log lines
const PREVIEW_CHARS: usize = 100;

/// Parse a raw provider response body into a quiz filed under `topic`
///
/// Any topic the model puts in its output is replaced by the requested one.
pub fn parse(raw_envelope: &str, topic: &str) -> Result<QuizItem, ParseError> {
    let text = extract_text(raw_envelope)?;
    let cleaned = strip_wrappers(&text);
    let json = slice_object(cleaned).map_err(|e| {
        warn!("No JSON object in model output: {}", preview(cleaned));
        e
    })?;

    if !looks_like_json(json) {
        warn!("Model output is not shaped like JSON: {}", preview(json));
        return Err(ParseError::Shape);
    }

    debug!("Quiz JSON extracted: {}", preview(json));

    let mut record: QuizRecord = serde_json::from_str(json).map_err(|e| {
        warn!("Quiz JSON rejected ({}): {}", e, preview(json));
        ParseError::Schema(e.to_string())
    })?;

    record.topik_virus = Some(topic.to_string());

    QuizItem::try_from(record).map_err(|e| {
        warn!("Quiz record incomplete ({}): {}", e, preview(json));
        e
    })
}

/// Embedded text of the first candidate's first part
fn extract_text(raw_envelope: &str) -> Result<String, ParseError> {
    if raw_envelope.trim().is_empty() {
        return Err(ParseError::Envelope("empty response body".to_string()));
    }

    let envelope: GenerateResponse =
        serde_json::from_str(raw_envelope).map_err(|e| ParseError::Envelope(e.to_string()))?;

    envelope
        .first_text()
        .map(str::to_owned)
        .ok_or_else(|| ParseError::Envelope("no candidate text".to_string()))
}

/// Remove code fences and a leading language tag
fn strip_wrappers(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text = text.trim();

    for tag in ["json", "JSON", "Json"] {
        if let Some(rest) = text.strip_prefix(tag) {
            if rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '[') {
                text = rest;
                break;
            }
        }
    }

    text.trim()
}

/// Span from the first `{` to the last `}`
fn slice_object(text: &str) -> Result<&str, ParseError> {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(ParseError::NoJsonBraces),
    }
}

fn looks_like_json(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::OptionLabel;
    use proptest::prelude::*;

    const QUIZ_JSON: &str = r#"{"pertanyaan":"Q","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"B"}"#;

    fn envelope(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn test_parse_well_formed_envelope() {
        let quiz = parse(&envelope(QUIZ_JSON), "Malware").unwrap();
        assert_eq!(quiz.correct_label(), OptionLabel::B);
        assert_eq!(quiz.question(), "Q");
        assert_eq!(quiz.option(OptionLabel::D), "d");
    }

    #[test]
    fn test_parse_strips_fences_and_prose() {
        let fenced = format!("```json\n{}\n```", QUIZ_JSON);
        assert!(parse(&envelope(&fenced), "Malware").is_ok());

        let chatty = format!("Tentu! Berikut kuisnya:\n{}\nSemoga membantu.", QUIZ_JSON);
        assert!(parse(&envelope(&chatty), "Malware").is_ok());

        let tagged = format!("JSON {}", QUIZ_JSON);
        assert!(parse(&envelope(&tagged), "Malware").is_ok());
    }

    #[test]
    fn test_requested_topic_replaces_model_topic() {
        let text = QUIZ_JSON.replace('}', r#","topik_virus":"Trojan"}"#);
        let quiz = parse(&envelope(&text), "  Ransomware ").unwrap();
        assert_eq!(quiz.topic(), "Ransomware");

        assert_eq!(
            parse(&envelope(QUIZ_JSON), " ").unwrap_err(),
            ParseError::Schema("field 'topik_virus' is empty".into())
        );
    }

    #[test]
    fn test_lowercase_label_normalized() {
        let text = QUIZ_JSON.replace(r#""B""#, r#""c""#);
        let quiz = parse(&envelope(&text), "Malware").unwrap();
        assert_eq!(quiz.correct_label(), OptionLabel::C);
    }

    #[test]
    fn test_rejects_bad_envelopes() {
        assert!(matches!(parse("", "Malware"), Err(ParseError::Envelope(_))));
        assert!(matches!(
            parse("<html>502</html>", "Malware"),
            Err(ParseError::Envelope(_))
        ));
        assert!(matches!(
            parse(r#"{"candidates":[]}"#, "Malware"),
            Err(ParseError::Envelope(_))
        ));
        assert!(matches!(
            parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#, "Malware"),
            Err(ParseError::Envelope(_))
        ));
    }

    #[test]
    fn test_rejects_text_without_braces() {
        let reply = envelope("Maaf, saya tidak bisa membuat kuis itu.");
        let err = parse(&reply, "Malware").unwrap_err();
        assert_eq!(err, ParseError::NoJsonBraces);

        let err = parse(&envelope("} reversed {"), "Malware").unwrap_err();
        assert_eq!(err, ParseError::NoJsonBraces);
    }

    #[test]
    fn test_rejects_missing_field() {
        let text = r#"{"pertanyaan":"Q","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","jawaban_benar":"A"}"#;
        let err = parse(&envelope(text), "Malware").unwrap_err();
        assert_eq!(err, ParseError::Schema("field 'pilihan_d' is missing".into()));
    }

    #[test]
    fn test_rejects_malformed_object() {
        let err = parse(&envelope(r#"{"pertanyaan": "Q", }"#), "Malware").unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_shape_check() {
        assert!(looks_like_json("{}"));
        assert!(looks_like_json(" [1] "));
        assert!(!looks_like_json("{]"));
        assert!(!looks_like_json("plain"));
    }

    #[test]
    fn test_preview_is_char_safe() {
        let long = "é".repeat(150);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
    }

    proptest! {
        #[test]
        fn prop_surrounding_prose_ignored(prefix in "[a-zA-Z .,:!\n]{0,40}", suffix in "[a-zA-Z .,:!\n]{0,40}") {
            let text = format!("{}{}{}", prefix, QUIZ_JSON, suffix);
            let quiz = parse(&envelope(&text), "Malware").unwrap();
            prop_assert_eq!(quiz.correct_label(), OptionLabel::B);
        }

        #[test]
        fn prop_parse_never_panics(body in ".*") {
            let _ = parse(&body, "Malware");
            let _ = parse(&envelope(&body), "Malware");
        }
    }
}
