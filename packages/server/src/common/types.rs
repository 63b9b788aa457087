//! Closed vocabularies shared between user preferences and canonical
//! postings. Wire format (serde) and storage format (postgres enums) agree
//! on the kebab-case spellings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the work happens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "work_arrangement", rename_all = "kebab-case")]
pub enum WorkArrangement {
    Remote,
    Hybrid,
    OnSite,
}

impl WorkArrangement {
    pub fn label(&self) -> &'static str {
        match self {
            WorkArrangement::Remote => "remote",
            WorkArrangement::Hybrid => "hybrid",
            WorkArrangement::OnSite => "on-site",
        }
    }
}

/// Contract shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "employment_type", rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
    Temporary,
    Volunteer,
}

impl EmploymentType {
    pub fn label(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full-time",
            EmploymentType::PartTime => "part-time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
            EmploymentType::Freelance => "freelance",
            EmploymentType::Temporary => "temporary",
            EmploymentType::Volunteer => "volunteer",
        }
    }
}

/// Seniority ladder, ordered from entry to executive. The ordering is load
/// bearing: the rule matcher scores level adjacency by rank distance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "experience_level", rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Executive,
}

impl ExperienceLevel {
    pub fn rank(&self) -> i32 {
        *self as i32
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Executive => "executive",
        }
    }

    /// Map free text (as the model emits it) onto the ladder.
    pub fn parse_loose(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("entry") || lower.contains("graduate") || lower.contains("trainee") {
            Some(ExperienceLevel::Entry)
        } else if lower.contains("junior") || lower.contains("associate") {
            Some(ExperienceLevel::Junior)
        } else if lower.contains("mid") || lower.contains("intermediate") {
            Some(ExperienceLevel::Mid)
        } else if lower.contains("senior") || lower.contains("expert") {
            Some(ExperienceLevel::Senior)
        } else if lower.contains("lead")
            || lower.contains("principal")
            || lower.contains("head")
            || lower.contains("manager")
        {
            Some(ExperienceLevel::Lead)
        } else if lower.contains("executive")
            || lower.contains("director")
            || lower.contains("vp")
            || lower.contains("c-level")
        {
            Some(ExperienceLevel::Executive)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_arrangement_wire_format() {
        assert_eq!(
            serde_json::to_string(&WorkArrangement::OnSite).unwrap(),
            "\"on-site\""
        );
        let parsed: WorkArrangement = serde_json::from_str("\"remote\"").unwrap();
        assert_eq!(parsed, WorkArrangement::Remote);
    }

    #[test]
    fn experience_level_ordering() {
        assert!(ExperienceLevel::Entry < ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::Entry.rank(), 0);
        assert_eq!(ExperienceLevel::Executive.rank(), 5);
    }

    #[test]
    fn loose_level_parsing() {
        assert_eq!(
            ExperienceLevel::parse_loose("Entry-level"),
            Some(ExperienceLevel::Entry)
        );
        assert_eq!(
            ExperienceLevel::parse_loose("Senior"),
            Some(ExperienceLevel::Senior)
        );
        assert_eq!(
            ExperienceLevel::parse_loose("Principal Engineer"),
            Some(ExperienceLevel::Lead)
        );
        assert_eq!(ExperienceLevel::parse_loose("unknown"), None);
    }
}
