use crate::transcript::{Speaker, Transcript};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Handed to the results screen when an interview completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub role: String,
    pub questions_asked: usize,
    pub questions_answered: usize,
    pub topics_covered: Vec<String>,
    pub transcript: Transcript,
    /// Wall-clock snapshot taken when the interview started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock snapshot taken when the completion event fired.
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: &'static str,
    pub score: u32,
    pub feedback: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorecard {
    pub categories: Vec<CategoryScore>,
    pub overall: u32,
    /// Rough talk time, two minutes per answered question.
    pub estimated_minutes: u32,
}

const COMMUNICATION_FLOOR: u32 = 60;
const DETAILED_ANSWER_CHARS: f64 = 100.0;
const ENGAGED_ANSWERS: usize = 4;
const PROFESSIONALISM_SCORE: u32 = 85;

impl SessionSummary {
    pub fn elapsed(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }

    pub fn scorecard(&self) -> Scorecard {
        let answers: Vec<usize> = self
            .transcript
            .answers()
            .map(|a| a.chars().count())
            .collect();
        let avg_len = if answers.is_empty() {
            0.0
        } else {
            answers.iter().sum::<usize>() as f64 / answers.len() as f64
        };

        let communication = CategoryScore {
            category: "Communication",
            score: ((avg_len / 2.0).round() as u32).clamp(COMMUNICATION_FLOOR, 100),
            feedback: if avg_len > DETAILED_ANSWER_CHARS {
                "Great detail in your responses!"
            } else {
                "Try to provide more detailed answers."
            },
        };
        let engagement = CategoryScore {
            category: "Engagement",
            score: ((self.questions_answered as f64 / 5.0 * 100.0).round() as u32).min(100),
            feedback: if self.questions_answered >= ENGAGED_ANSWERS {
                "Excellent engagement throughout!"
            } else {
                "Good participation, consider completing more questions."
            },
        };
        let professionalism = CategoryScore {
            category: "Professionalism",
            score: PROFESSIONALISM_SCORE,
            feedback: "Maintained professional tone throughout the interview.",
        };

        let categories = vec![communication, engagement, professionalism];
        let total: u32 = categories.iter().map(|c| c.score).sum();
        let overall = (total as f64 / categories.len() as f64).round() as u32;

        Scorecard {
            categories,
            overall,
            estimated_minutes: self.questions_answered as u32 * 2,
        }
    }

    pub(crate) fn count_turns(transcript: &Transcript) -> (usize, usize) {
        (
            transcript.count(Speaker::Ai),
            transcript.count(Speaker::User),
        )
    }
}
