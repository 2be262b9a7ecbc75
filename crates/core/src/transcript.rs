use serde::{Deserialize, Serialize};

/// Who produced a turn in the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Ai,
    User,
}

impl Speaker {
    /// Label used when the conversation is rendered for an oracle prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Ai => "Interviewer",
            Speaker::User => "Candidate",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Append-only, chronologically ordered record of the interview.
///
/// Turns alternate `Ai, User, Ai, User, ...` starting with `Ai`. The only
/// mutators are [`Transcript::push_question`] and [`Transcript::push_answer`],
/// which refuse any push that would break the alternation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interviewer question. Returns `false` (and appends nothing)
    /// if the previous turn was also an interviewer turn.
    pub fn push_question(&mut self, text: impl Into<String>) -> bool {
        if self.last_speaker() == Some(Speaker::Ai) {
            return false;
        }
        self.turns.push(Turn {
            speaker: Speaker::Ai,
            text: text.into(),
        });
        true
    }

    /// Appends a candidate answer. Only valid directly after a question.
    pub fn push_answer(&mut self, text: impl Into<String>) -> bool {
        if self.last_speaker() != Some(Speaker::Ai) {
            return false;
        }
        self.turns.push(Turn {
            speaker: Speaker::User,
            text: text.into(),
        });
        true
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn last_speaker(&self) -> Option<Speaker> {
        self.turns.last().map(|t| t.speaker)
    }

    pub fn last_question(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Ai)
            .map(|t| t.text.as_str())
    }

    pub fn count(&self, speaker: Speaker) -> usize {
        self.turns.iter().filter(|t| t.speaker == speaker).count()
    }

    pub fn answers(&self) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::User)
            .map(|t| t.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders turns as `Interviewer: ...` / `Candidate: ...` lines.
    pub fn render(turns: &[Turn]) -> String {
        turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker.label(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
