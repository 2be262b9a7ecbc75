use std::time::Duration;

/// Spoken when the interview ends without an oracle-supplied closing remark.
pub const DEFAULT_CLOSING_REMARK: &str = "Thank you for completing the mock interview. You've covered multiple topics and provided detailed responses. Great job!";

/// Spoken when the oracle has failed too many times in a row.
pub const ORACLE_UNAVAILABLE_REMARK: &str = "I'm having trouble reaching the interview service, so let's stop here. Thank you for your time.";

/// Tunables for a single interview run.
#[derive(Debug, Clone)]
pub struct InterviewSettings {
    /// Consecutive fallback questions tolerated before the interview ends.
    pub max_consecutive_failures: usize,
    /// Number of recent turns sent to oracles that take a window.
    pub history_window: usize,
    /// Pause between the closing remark and the completion event.
    pub closing_delay: Duration,
    /// Case-insensitive phrases that end the interview when spoken.
    pub end_phrases: Vec<String>,
    pub closing_remark: String,
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
            history_window: 6,
            closing_delay: Duration::from_millis(3000),
            end_phrases: vec!["end interview".to_string(), "finish interview".to_string()],
            closing_remark: DEFAULT_CLOSING_REMARK.to_string(),
        }
    }
}

impl InterviewSettings {
    /// True if the answer asks to stop the interview.
    pub fn is_end_request(&self, answer: &str) -> bool {
        let answer = answer.to_lowercase();
        self.end_phrases
            .iter()
            .any(|phrase| answer.contains(&phrase.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_phrases_match_case_insensitively() {
        let settings = InterviewSettings::default();
        assert!(settings.is_end_request("OK, let's End Interview now"));
        assert!(settings.is_end_request("please FINISH INTERVIEW"));
        assert!(!settings.is_end_request("I'd like to end the project early"));
    }
}
