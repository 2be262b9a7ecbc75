use crate::summary::SessionSummary;
use crate::topic::{ROLE_PLANS, RoleMatcher};

/// One entry on the welcome screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCard {
    pub title: &'static str,
    pub description: &'static str,
}

pub fn role_catalogue() -> Vec<RoleCard> {
    ROLE_PLANS
        .iter()
        .map(|plan| RoleCard {
            title: plan.role,
            description: plan.description,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Screen {
    #[default]
    Welcome,
    Interview { role: String },
    Results(Box<SessionSummary>),
}

/// Screen flow: `Welcome -> Interview -> Results -> Welcome`.
///
/// Callbacks that do not apply to the current screen are ignored.
#[derive(Default)]
pub struct InterviewApp {
    screen: Screen,
    matcher: RoleMatcher,
}

impl InterviewApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Resolves free-form input to a known role and enters the interview.
    /// Returns the resolved role.
    pub fn on_start_interview(&mut self, role: &str) -> Option<String> {
        if self.screen != Screen::Welcome {
            tracing::warn!(screen = ?self.screen, "Start requested outside the welcome screen");
            return None;
        }
        let role = self.matcher.resolve(role);
        if role.is_empty() {
            return None;
        }
        tracing::info!(%role, "Entering interview");
        self.screen = Screen::Interview { role: role.clone() };
        Some(role)
    }

    pub fn on_complete_interview(&mut self, summary: SessionSummary) {
        if !matches!(self.screen, Screen::Interview { .. }) {
            tracing::warn!("Completion received outside an interview");
            return;
        }
        self.screen = Screen::Results(Box::new(summary));
    }

    /// Also serves as "start new" from the results screen.
    pub fn on_back_to_welcome(&mut self) {
        self.screen = Screen::Welcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;
    use chrono::Utc;

    fn summary(role: &str) -> SessionSummary {
        let now = Utc::now();
        SessionSummary {
            role: role.to_string(),
            questions_asked: 0,
            questions_answered: 0,
            topics_covered: Vec::new(),
            transcript: Transcript::new(),
            started_at: now,
            completed_at: now,
        }
    }

    #[test]
    fn catalogue_lists_every_role() {
        let titles: Vec<_> = role_catalogue().iter().map(|c| c.title).collect();
        assert_eq!(
            titles,
            ["Software Engineer", "Data Analyst", "Product Manager", "Marketing Manager"]
        );
        assert!(role_catalogue().iter().all(|c| !c.description.is_empty()));
    }

    #[test]
    fn full_screen_cycle() {
        let mut app = InterviewApp::new();
        assert_eq!(app.screen(), &Screen::Welcome);

        let role = app.on_start_interview("product mgr").unwrap();
        assert_eq!(role, "Product Manager");
        assert_eq!(app.screen(), &Screen::Interview { role: role.clone() });

        app.on_complete_interview(summary(&role));
        assert!(matches!(app.screen(), Screen::Results(s) if s.role == "Product Manager"));

        app.on_back_to_welcome();
        assert_eq!(app.screen(), &Screen::Welcome);
    }

    #[test]
    fn out_of_place_callbacks_are_ignored() {
        let mut app = InterviewApp::new();
        app.on_complete_interview(summary("Data Analyst"));
        assert_eq!(app.screen(), &Screen::Welcome);

        app.on_start_interview("Data Analyst").unwrap();
        assert!(app.on_start_interview("Software Engineer").is_none());
        assert_eq!(
            app.screen(),
            &Screen::Interview {
                role: "Data Analyst".to_string()
            }
        );
    }

    #[test]
    fn blank_role_does_not_start() {
        let mut app = InterviewApp::new();
        assert!(app.on_start_interview("   ").is_none());
        assert_eq!(app.screen(), &Screen::Welcome);
    }
}
