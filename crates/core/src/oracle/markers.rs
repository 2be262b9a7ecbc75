//! Control markers the oracle may embed in its free-form reply.
//!
//! A reply may carry any combination of `QUESTION:`, `NEW_TOPIC:` and
//! `END_INTERVIEW:`, or none at all. No markers means "continue, same
//! topic". An end marker wins over a topic marker. Marker text never
//! reaches the question shown to the candidate.

pub const QUESTION_MARKER: &str = "QUESTION:";
pub const TOPIC_MARKER: &str = "NEW_TOPIC:";
pub const END_MARKER: &str = "END_INTERVIEW:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub text: String,
    pub should_continue: bool,
    pub new_topic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Question,
    Topic,
    End,
}

impl Marker {
    fn token(self) -> &'static str {
        match self {
            Marker::Question => QUESTION_MARKER,
            Marker::Topic => TOPIC_MARKER,
            Marker::End => END_MARKER,
        }
    }
}

pub fn parse_reply(raw: &str) -> OracleReply {
    let mut found: Vec<(usize, Marker)> = [Marker::Question, Marker::Topic, Marker::End]
        .into_iter()
        .flat_map(|m| raw.match_indices(m.token()).map(move |(at, _)| (at, m)))
        .collect();
    found.sort_by_key(|(at, _)| *at);

    let mut body: Vec<&str> = Vec::new();
    let mut new_topic = None;
    let mut ended = false;

    // Text before the first marker belongs to the question.
    let lead_end = found.first().map(|(at, _)| *at).unwrap_or(raw.len());
    body.push(&raw[..lead_end]);

    for (i, (at, marker)) in found.iter().enumerate() {
        let start = at + marker.token().len();
        let end = found.get(i + 1).map(|(next, _)| *next).unwrap_or(raw.len());
        let segment = &raw[start..end];

        match marker {
            Marker::Question => body.push(segment),
            Marker::End => {
                ended = true;
                body.push(segment);
            }
            Marker::Topic => {
                // The label runs to the end of its line; anything after
                // that is still question text.
                let (label, rest) = segment.split_once('\n').unwrap_or((segment, ""));
                let label = label.trim();
                if new_topic.is_none() && !label.is_empty() {
                    new_topic = Some(label.to_string());
                }
                body.push(rest);
            }
        }
    }

    let text = body
        .iter()
        .flat_map(|part| part.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    OracleReply {
        text,
        should_continue: !ended,
        new_topic: if ended { None } else { new_topic },
    }
}
