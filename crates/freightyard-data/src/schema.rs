//! Serde schema for scenario scripts.
//!
//! A scenario lists jobs to push through reserve, take and finish in order,
//! as one user or per-step users:
//!
//! ```toml
//! user = "Insomnia"
//!
//! [[steps]]
//! job = "CM-SSL-1"
//!
//! [[steps]]
//! job = "CM-SFH-3"
//! user = "bob"
//! ```

use serde::{Deserialize, Serialize};

/// User name applied when neither the script nor the step names one.
pub const DEFAULT_SCENARIO_USER: &str = "scenario";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioScript {
    /// Default user for every step.
    #[serde(default)]
    pub user: Option<String>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub job: String,
    #[serde(default)]
    pub user: Option<String>,
}

impl ScenarioScript {
    /// A script running `jobs` in order as `user`.
    pub fn from_jobs<I, S>(user: Option<String>, jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user,
            steps: jobs
                .into_iter()
                .map(|job| ScenarioStep {
                    job: job.into(),
                    user: None,
                })
                .collect(),
        }
    }

    /// The user who runs `step`.
    pub fn user_for<'a>(&'a self, step: &'a ScenarioStep) -> &'a str {
        step.user
            .as_deref()
            .or(self.user.as_deref())
            .unwrap_or(DEFAULT_SCENARIO_USER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_falls_back_to_default() {
        let script = ScenarioScript::from_jobs(None, ["SM-SSL-1"]);
        assert_eq!(script.user_for(&script.steps[0]), DEFAULT_SCENARIO_USER);
    }

    #[test]
    fn step_user_wins() {
        let mut script = ScenarioScript::from_jobs(Some("alice".into()), ["A", "B"]);
        script.steps[1].user = Some("bob".into());
        assert_eq!(script.user_for(&script.steps[0]), "alice");
        assert_eq!(script.user_for(&script.steps[1]), "bob");
    }
}
