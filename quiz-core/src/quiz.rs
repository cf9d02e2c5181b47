//! Quiz domain types
//!
//! [`QuizRecord`] is the loose wire shape shared by the bundled dataset and the
//! model output. [`QuizItem`] is the validated, immutable form handed to callers.

use crate::error::ParseError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// One of the four answer labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = ParseError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(ParseError::Schema(format!(
                "correct label must be one of A-D, got '{}'",
                other
            ))),
        }
    }
}

/// Difficulty tier carried by dataset entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Mudah,
    Sedang,
    Sulit,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mudah" | "easy" => Ok(Difficulty::Mudah),
            "sedang" | "medium" => Ok(Difficulty::Sedang),
            "sulit" | "hard" => Ok(Difficulty::Sulit),
            _ => Err(()),
        }
    }
}

/// Wire record for a single quiz
///
/// Every field is optional so that a missing field is caught by
/// [`QuizItem::try_from`] rather than defaulted to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuizRecord {
    #[serde(default, alias = "question")]
    pub pertanyaan: Option<String>,
    #[serde(default, alias = "option_a")]
    pub pilihan_a: Option<String>,
    #[serde(default, alias = "option_b")]
    pub pilihan_b: Option<String>,
    #[serde(default, alias = "option_c")]
    pub pilihan_c: Option<String>,
    #[serde(default, alias = "option_d")]
    pub pilihan_d: Option<String>,
    #[serde(default, alias = "correct_answer")]
    pub jawaban_benar: Option<String>,
    #[serde(default, alias = "topic")]
    pub topik_virus: Option<String>,
    #[serde(default, alias = "difficulty")]
    pub tingkat_kesulitan: Option<String>,
}

/// A validated multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizItem {
    question: String,
    options: [String; 4],
    correct: OptionLabel,
    topic: String,
    difficulty: Option<Difficulty>,
}

impl QuizItem {
    /// Build a quiz, rejecting blank question, option or topic text
    pub fn new(
        question: impl Into<String>,
        options: [String; 4],
        correct: OptionLabel,
        topic: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(ParseError::Schema("question text is empty".to_string()));
        }

        let options = options.map(|o| o.trim().to_string());
        if let Some(label) = OptionLabel::ALL
            .iter()
            .find(|label| options[label.index()].is_empty())
        {
            return Err(ParseError::Schema(format!("option {} is empty", label)));
        }

        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            return Err(ParseError::Schema("topic is empty".to_string()));
        }

        Ok(Self {
            question,
            options,
            correct,
            topic,
            difficulty: None,
        })
    }

    pub fn with_difficulty(mut self, difficulty: Option<Difficulty>) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn options(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        OptionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.option(label)))
    }

    pub fn correct_label(&self) -> OptionLabel {
        self.correct
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    /// Check a player's answer, ignoring case and surrounding whitespace
    pub fn is_correct(&self, chosen: &str) -> bool {
        chosen
            .parse::<OptionLabel>()
            .map(|label| label == self.correct)
            .unwrap_or(false)
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, ParseError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ParseError::Schema(format!("field '{}' is empty", name))),
        None => Err(ParseError::Schema(format!("field '{}' is missing", name))),
    }
}

impl TryFrom<QuizRecord> for QuizItem {
    type Error = ParseError;

    fn try_from(record: QuizRecord) -> Result<Self, Self::Error> {
        let question = required(record.pertanyaan, "pertanyaan")?;
        let options = [
            required(record.pilihan_a, "pilihan_a")?,
            required(record.pilihan_b, "pilihan_b")?,
            required(record.pilihan_c, "pilihan_c")?,
            required(record.pilihan_d, "pilihan_d")?,
        ];
        let correct = required(record.jawaban_benar, "jawaban_benar")?.parse()?;
        let topic = required(record.topik_virus, "topik_virus")?;
        let difficulty = record
            .tingkat_kesulitan
            .as_deref()
            .and_then(|d| d.parse().ok());

        Ok(QuizItem::new(question, options, correct, topic)?
            .with_difficulty(difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> QuizRecord {
        QuizRecord {
            pertanyaan: Some("Apa itu phishing?".into()),
            pilihan_a: Some("Penipuan lewat email".into()),
            pilihan_b: Some("Antivirus".into()),
            pilihan_c: Some("Firewall".into()),
            pilihan_d: Some("Backup".into()),
            jawaban_benar: Some("a".into()),
            topik_virus: Some("Phishing".into()),
            tingkat_kesulitan: Some("mudah".into()),
        }
    }

    #[test]
    fn test_record_conversion() {
        let quiz = QuizItem::try_from(record()).unwrap();
        assert_eq!(quiz.correct_label(), OptionLabel::A);
        assert_eq!(quiz.topic(), "Phishing");
        assert_eq!(quiz.difficulty(), Some(Difficulty::Mudah));
        assert_eq!(quiz.option(OptionLabel::B), "Antivirus");
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut rec = record();
        rec.pilihan_c = None;
        let err = QuizItem::try_from(rec).unwrap_err();
        assert_eq!(err, ParseError::Schema("field 'pilihan_c' is missing".into()));
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut rec = record();
        rec.pertanyaan = Some("  ".into());
        assert!(QuizItem::try_from(rec).is_err());
    }

    #[test]
    fn test_invalid_label_rejected() {
        let mut rec = record();
        rec.jawaban_benar = Some("E".into());
        assert!(matches!(QuizItem::try_from(rec), Err(ParseError::Schema(_))));
    }

    #[test]
    fn test_answer_check_is_case_insensitive() {
        let quiz = QuizItem::try_from(record()).unwrap();
        assert!(quiz.is_correct("A"));
        assert!(quiz.is_correct("a"));
        assert!(quiz.is_correct(" a "));
        assert_eq!(quiz.is_correct("a"), quiz.is_correct("A"));
        for wrong in ["B", "c", "D", "", "AB"] {
            assert!(!quiz.is_correct(wrong), "{} should be wrong", wrong);
        }
    }

    #[test]
    fn test_topic_required() {
        let mut rec = record();
        rec.topik_virus = None;
        let err = QuizItem::try_from(rec).unwrap_err();
        assert_eq!(err, ParseError::Schema("field 'topik_virus' is missing".into()));

        let options = ["a", "b", "c", "d"].map(String::from);
        let err = QuizItem::new("Q", options, OptionLabel::A, "   ").unwrap_err();
        assert_eq!(err, ParseError::Schema("topic is empty".into()));
    }

    #[test]
    fn test_english_aliases_accepted() {
        let json = r#"{"question":"Q","option_a":"a","option_b":"b","option_c":"c","option_d":"d","correct_answer":"D","topic":"Worm"}"#;
        let rec: QuizRecord = serde_json::from_str(json).unwrap();
        let quiz = QuizItem::try_from(rec).unwrap();
        assert_eq!(quiz.correct_label(), OptionLabel::D);
        assert_eq!(quiz.topic(), "Worm");
    }
}
