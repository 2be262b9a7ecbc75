use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// Follow-ups asked after a topic's primary questions run out. Fixed policy.
pub const FOLLOW_UPS_PER_TOPIC: usize = 2;

#[derive(Debug)]
pub struct TopicPlan {
    pub name: &'static str,
    pub questions: &'static [&'static str],
    pub follow_ups: &'static [&'static str],
}

impl TopicPlan {
    /// Questions this topic serves before the interview moves on.
    pub fn length(&self) -> usize {
        let follow_ups = if self.follow_ups.is_empty() {
            0
        } else {
            FOLLOW_UPS_PER_TOPIC
        };
        self.questions.len() + follow_ups
    }
}

#[derive(Debug)]
pub struct RolePlan {
    pub role: &'static str,
    pub description: &'static str,
    pub topics: &'static [TopicPlan],
}

/// Position inside a role plan: which topic, and how many of its questions
/// have already been served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopicCursor {
    pub topic_index: usize,
    pub asked_in_topic: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Ask {
        topic_index: usize,
        text: &'static str,
    },
    Exhausted,
}

impl RolePlan {
    /// Looks up a plan by exact (case-insensitive) title, falling back to
    /// the Software Engineer plan.
    pub fn for_role(role: &str) -> &'static RolePlan {
        ROLE_PLANS
            .iter()
            .find(|plan| plan.role.eq_ignore_ascii_case(role.trim()))
            .unwrap_or(&ROLE_PLANS[0])
    }

    pub fn topic_position(&self, name: &str) -> Option<usize> {
        self.topics.iter().position(|t| t.name == name)
    }

    pub fn total_questions(&self) -> usize {
        self.topics.iter().map(TopicPlan::length).sum()
    }

    /// Primary questions in order, then up to two follow-ups (cycling if the
    /// topic has fewer), then the next topic's first question.
    pub fn next_step(&self, cursor: TopicCursor) -> Step {
        let mut topic_index = cursor.topic_index;
        let mut asked = cursor.asked_in_topic;

        while let Some(topic) = self.topics.get(topic_index) {
            let primaries = topic.questions.len();
            if asked < primaries {
                return Step::Ask {
                    topic_index,
                    text: topic.questions[asked],
                };
            }
            if asked < topic.length() {
                let follow_up = (asked - primaries) % topic.follow_ups.len();
                return Step::Ask {
                    topic_index,
                    text: topic.follow_ups[follow_up],
                };
            }
            topic_index += 1;
            asked = 0;
        }

        Step::Exhausted
    }

    /// Percentage of the plan served so far, capped at 100.
    pub fn progress(&self, cursor: TopicCursor) -> f32 {
        let total = self.total_questions();
        if total == 0 {
            return 100.0;
        }
        let done: usize = self
            .topics
            .iter()
            .take(cursor.topic_index)
            .map(TopicPlan::length)
            .sum::<usize>()
            + cursor.asked_in_topic;
        (done as f32 / total as f32 * 100.0).min(100.0)
    }
}

/// Resolves free-form role input to a known role title.
pub struct RoleMatcher {
    matcher: SkimMatcherV2,
}

impl Default for RoleMatcher {
    fn default() -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
        }
    }
}

impl RoleMatcher {
    /// Returns the best fuzzy match among the known roles, or the trimmed
    /// input unchanged when nothing matches.
    pub fn resolve(&self, input: &str) -> String {
        let input = input.trim();
        ROLE_PLANS
            .iter()
            .filter_map(|plan| {
                self.matcher
                    .fuzzy_match(&plan.role.to_lowercase(), &input.to_lowercase())
                    .map(|score| (score, plan.role))
            })
            .filter(|(score, _)| *score > 0)
            .max_by_key(|(score, _)| *score)
            .map(|(_, role)| role.to_string())
            .unwrap_or_else(|| input.to_string())
    }
}

pub static ROLE_PLANS: &[RolePlan] = &[
    RolePlan {
        role: "Software Engineer",
        description: "Technical questions, coding challenges, system design",
        topics: &[
            TopicPlan {
                name: "Background & Experience",
                questions: &[
                    "Hello, welcome to your mock interview session. Can you tell me about yourself and your software engineering background?",
                    "What programming languages are you most comfortable with and why did you choose them?",
                    "How many years of experience do you have in software development?",
                    "What type of projects have you worked on recently?",
                ],
                follow_ups: &[
                    "Can you elaborate more on that specific technology?",
                    "What challenges did you face in that project?",
                    "How did you overcome those technical difficulties?",
                    "What would you do differently if you had to redo that project?",
                ],
            },
            TopicPlan {
                name: "Technical Skills",
                questions: &[
                    "Tell me about a challenging technical problem you've solved recently.",
                    "How do you approach debugging complex issues in your code?",
                    "What's your experience with version control systems like Git?",
                    "How do you ensure code quality in your projects?",
                ],
                follow_ups: &[
                    "Can you walk me through your debugging process step by step?",
                    "What tools do you use for code review?",
                    "How do you handle merge conflicts?",
                    "What testing strategies do you implement?",
                ],
            },
            TopicPlan {
                name: "Problem Solving",
                questions: &[
                    "Describe a time when you had to learn a new technology quickly.",
                    "How do you stay updated with the latest technology trends?",
                    "Tell me about a time you disagreed with a technical decision.",
                    "How do you handle tight deadlines in development projects?",
                ],
                follow_ups: &[
                    "What resources did you use to learn that technology?",
                    "How long did it take you to become proficient?",
                    "What was the outcome of that disagreement?",
                    "How do you prioritize tasks when under pressure?",
                ],
            },
        ],
    },
    RolePlan {
        role: "Data Analyst",
        description: "SQL queries, data interpretation, statistical analysis",
        topics: &[
            TopicPlan {
                name: "Background & Experience",
                questions: &[
                    "Hello, welcome to your mock interview session. Can you tell me about your experience with data analysis?",
                    "What data analysis tools and technologies are you proficient in?",
                    "What types of datasets have you worked with?",
                    "How do you approach a new data analysis project?",
                ],
                follow_ups: &[
                    "Which tool do you prefer and why?",
                    "What was the largest dataset you've analyzed?",
                    "How do you handle missing or inconsistent data?",
                    "What's your process for data validation?",
                ],
            },
            TopicPlan {
                name: "Technical Skills",
                questions: &[
                    "What data visualization tools have you worked with?",
                    "How do you ensure data quality in your analysis?",
                    "Tell me about your experience with SQL and databases.",
                    "What statistical methods do you commonly use?",
                ],
                follow_ups: &[
                    "Can you describe a complex visualization you've created?",
                    "What's your approach to data cleaning?",
                    "How do you optimize SQL queries for large datasets?",
                    "When would you use regression analysis versus other methods?",
                ],
            },
            TopicPlan {
                name: "Business Impact",
                questions: &[
                    "Tell me about a time when you discovered an interesting insight from data.",
                    "How do you present complex data to non-technical stakeholders?",
                    "Describe a project where your analysis influenced business decisions.",
                    "How do you measure the success of your analysis?",
                ],
                follow_ups: &[
                    "What was the business impact of that insight?",
                    "How do you simplify technical concepts for executives?",
                    "What was the outcome of that business decision?",
                    "What metrics do you track to validate your analysis?",
                ],
            },
        ],
    },
    RolePlan {
        role: "Product Manager",
        description: "Product strategy, user experience, stakeholder management",
        topics: &[
            TopicPlan {
                name: "Background & Experience",
                questions: &[
                    "Hello, welcome to your mock interview session. What drew you to product management?",
                    "What products have you managed in your career?",
                    "How do you define a successful product?",
                    "What's your experience with product lifecycle management?",
                ],
                follow_ups: &[
                    "What aspects of product management do you enjoy most?",
                    "What was your biggest product success?",
                    "How do you measure product success?",
                    "How do you handle product failures or setbacks?",
                ],
            },
            TopicPlan {
                name: "Strategy & Prioritization",
                questions: &[
                    "How do you prioritize features in a product roadmap?",
                    "Tell me about a time you had to make a difficult product decision.",
                    "How do you balance user needs with business objectives?",
                    "What frameworks do you use for product planning?",
                ],
                follow_ups: &[
                    "What criteria do you use for prioritization?",
                    "How did you gather data to make that decision?",
                    "Can you give me an example of this balance?",
                    "How do you adapt your roadmap when priorities change?",
                ],
            },
            TopicPlan {
                name: "User & Market Focus",
                questions: &[
                    "How do you gather and incorporate user feedback?",
                    "What metrics do you use to measure product success?",
                    "How do you conduct market research for new features?",
                    "Tell me about a time you pivoted based on user feedback.",
                ],
                follow_ups: &[
                    "What methods do you use to collect feedback?",
                    "Which metrics are most important for your products?",
                    "How do you validate market demand?",
                    "What was the result of that pivot?",
                ],
            },
        ],
    },
    RolePlan {
        role: "Marketing Manager",
        description: "Campaign strategy, market analysis, brand management",
        topics: &[
            TopicPlan {
                name: "Background & Experience",
                questions: &[
                    "Hello, welcome to your mock interview session. What's your experience in marketing?",
                    "What marketing channels have you worked with?",
                    "How do you approach developing a marketing strategy?",
                    "What types of campaigns have you managed?",
                ],
                follow_ups: &[
                    "Which marketing channel has been most effective for you?",
                    "What's your process for market research?",
                    "Can you describe your most successful campaign?",
                    "How do you adapt strategies for different audiences?",
                ],
            },
            TopicPlan {
                name: "Campaign Management",
                questions: &[
                    "How do you measure the success of a marketing campaign?",
                    "Tell me about a marketing challenge you've overcome.",
                    "What's your approach to budget allocation across channels?",
                    "How do you A/B test your marketing initiatives?",
                ],
                follow_ups: &[
                    "What KPIs do you focus on most?",
                    "What strategies did you use to overcome that challenge?",
                    "How do you determine ROI for different channels?",
                    "Can you share an example of a successful A/B test?",
                ],
            },
            TopicPlan {
                name: "Audience & Analytics",
                questions: &[
                    "What's your approach to understanding target audiences?",
                    "How do you stay updated with marketing trends?",
                    "Tell me about your experience with marketing analytics.",
                    "How do you personalize marketing messages for different segments?",
                ],
                follow_ups: &[
                    "What research methods do you use for audience analysis?",
                    "Which trends are you most excited about currently?",
                    "What analytics tools do you prefer?",
                    "Can you give me an example of successful personalization?",
                ],
            },
        ],
    },
];
