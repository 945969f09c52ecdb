use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::jobs::EmploymentType;

/// Education levels, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
    #[default]
    None,
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl DegreeLevel {
    pub const fn label(self) -> &'static str {
        match self {
            DegreeLevel::None => "none",
            DegreeLevel::HighSchool => "high_school",
            DegreeLevel::Associate => "associate",
            DegreeLevel::Bachelor => "bachelor",
            DegreeLevel::Master => "master",
            DegreeLevel::Doctorate => "doctorate",
        }
    }
}

impl FromStr for DegreeLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "" | "none" => Ok(DegreeLevel::None),
            "high_school" => Ok(DegreeLevel::HighSchool),
            "associate" => Ok(DegreeLevel::Associate),
            "bachelor" => Ok(DegreeLevel::Bachelor),
            "master" => Ok(DegreeLevel::Master),
            "doctorate" | "phd" => Ok(DegreeLevel::Doctorate),
            _ => Err(format!("unknown degree level `{}`", value.trim())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: DegreeLevel,
    #[serde(default)]
    pub field: String,
    pub start_year: i32,
    #[serde(default)]
    pub end_year: Option<i32>,
}

/// One position. An absent `end` means the candidate still holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub desired_employment: Vec<EmploymentType>,
    #[serde(default)]
    pub open_to_work: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProfile {
    pub user_id: UserId,
    pub headline: String,
    pub summary: String,
    pub location: String,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub desired_employment: Vec<EmploymentType>,
    pub open_to_work: bool,
    pub updated_at: DateTime<Utc>,
}

const DAYS_PER_YEAR: i64 = 365;

impl JobProfile {
    /// Whole years covered by the union of all positions. Overlapping
    /// positions count once and open-ended ones run until `today`.
    pub fn total_experience_years(&self, today: NaiveDate) -> u32 {
        let mut spans: Vec<(NaiveDate, NaiveDate)> = self
            .experience
            .iter()
            .filter(|e| e.start < today)
            .map(|e| (e.start, e.end.unwrap_or(today).min(today)))
            .filter(|(start, end)| start < end)
            .collect();
        spans.sort();

        let mut total_days = 0;
        let mut current: Option<(NaiveDate, NaiveDate)> = None;
        for (start, end) in spans {
            current = match current {
                Some((open_start, open_end)) if start <= open_end => {
                    Some((open_start, open_end.max(end)))
                }
                Some((open_start, open_end)) => {
                    total_days += (open_end - open_start).num_days();
                    Some((start, end))
                }
                None => Some((start, end)),
            };
        }
        if let Some((start, end)) = current {
            total_days += (end - start).num_days();
        }

        u32::try_from(total_days / DAYS_PER_YEAR).unwrap_or(u32::MAX)
    }

    pub fn highest_degree(&self) -> DegreeLevel {
        self.education
            .iter()
            .map(|e| e.degree)
            .max()
            .unwrap_or_default()
    }
}
