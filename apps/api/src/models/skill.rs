use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How well a user knows a skill. Stored as the capitalised variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

impl Proficiency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "Beginner",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Advanced => "Advanced",
        }
    }

    /// Points awarded per required skill when computing a match score.
    pub fn points(&self) -> u32 {
        match self {
            Proficiency::Beginner => 1,
            Proficiency::Intermediate => 2,
            Proficiency::Advanced => 3,
        }
    }
}

impl FromStr for Proficiency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Proficiency::Beginner),
            "intermediate" => Ok(Proficiency::Intermediate),
            "advanced" | "expert" => Ok(Proficiency::Advanced),
            other => Err(format!("Unknown proficiency '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

/// A skill held by a user, joined with its name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkillRow {
    pub skill_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub proficiency: String,
}

impl UserSkillRow {
    /// Unparseable stored values count as `Beginner`.
    pub fn proficiency(&self) -> Proficiency {
        self.proficiency.parse().unwrap_or(Proficiency::Beginner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_per_tier() {
        assert_eq!(Proficiency::Beginner.points(), 1);
        assert_eq!(Proficiency::Intermediate.points(), 2);
        assert_eq!(Proficiency::Advanced.points(), 3);
    }

    #[test]
    fn test_parse_accepts_lowercase() {
        assert_eq!("advanced".parse::<Proficiency>().unwrap(), Proficiency::Advanced);
        assert!("guru".parse::<Proficiency>().is_err());
    }

    #[test]
    fn test_bad_stored_value_counts_as_beginner() {
        let row = UserSkillRow {
            skill_id: 1,
            name: "Rust".into(),
            category: None,
            proficiency: "???".into(),
        };
        assert_eq!(row.proficiency(), Proficiency::Beginner);
    }
}
