use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::ChargeReceipt;
use crate::ids::{EntityId, JobId, UserId};
use crate::profiles::DegreeLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl EmploymentType {
    pub const fn label(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
            EmploymentType::Temporary => "temporary",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match loose_key(value).as_str() {
            "full_time" | "fulltime" => Ok(EmploymentType::FullTime),
            "part_time" | "parttime" => Ok(EmploymentType::PartTime),
            "contract" => Ok(EmploymentType::Contract),
            "internship" => Ok(EmploymentType::Internship),
            "temporary" => Ok(EmploymentType::Temporary),
            _ => Err(format!("unknown employment type `{}`", value.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workplace {
    OnSite,
    Hybrid,
    Remote,
}

impl Workplace {
    pub const fn label(self) -> &'static str {
        match self {
            Workplace::OnSite => "on_site",
            Workplace::Hybrid => "hybrid",
            Workplace::Remote => "remote",
        }
    }
}

impl FromStr for Workplace {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match loose_key(value).as_str() {
            "on_site" | "onsite" | "office" => Ok(Workplace::OnSite),
            "hybrid" => Ok(Workplace::Hybrid),
            "remote" => Ok(Workplace::Remote),
            _ => Err(format!("unknown workplace `{}`", value.trim())),
        }
    }
}

fn loose_key(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub min_experience_years: u32,
    #[serde(default)]
    pub education: DegreeLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Published,
    Paused,
    Closed,
    Expired,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Published => "published",
            JobStatus::Paused => "paused",
            JobStatus::Closed => "closed",
            JobStatus::Expired => "expired",
        }
    }
}

/// Paid boost in the listing. `ends_on` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsorship {
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub credits: u32,
}

impl Sponsorship {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.starts_on <= today && today < self.ends_on
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub entity_id: EntityId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub workplace: Workplace,
    pub requirements: JobRequirements,
    pub salary: Option<SalaryRange>,
    pub status: JobStatus,
    pub published_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub sponsorship: Option<Sponsorship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_charge: Option<ChargeReceipt>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_sponsored(&self, today: NaiveDate) -> bool {
        self.sponsorship
            .as_ref()
            .is_some_and(|s| s.is_active(today))
    }

    /// Published and inside its listing window.
    pub fn is_listed(&self, today: NaiveDate) -> bool {
        self.status == JobStatus::Published && self.expires_on.is_some_and(|end| today < end)
    }
}

/// Editable part of a job, used for creation, updates and CSV import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub employment_type: EmploymentType,
    pub workplace: Workplace,
    #[serde(default)]
    pub requirements: JobRequirements,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_from_loose_spellings() {
        assert_eq!("Full-Time".parse::<EmploymentType>(), Ok(EmploymentType::FullTime));
        assert_eq!("part time".parse::<EmploymentType>(), Ok(EmploymentType::PartTime));
        assert_eq!("On Site".parse::<Workplace>(), Ok(Workplace::OnSite));
        assert!("gig".parse::<EmploymentType>().is_err());
    }

    #[test]
    fn sponsorship_window_is_half_open() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 9, d).expect("valid date");
        let sponsorship = Sponsorship {
            starts_on: day(3),
            ends_on: day(6),
            credits: 3,
        };
        assert!(!sponsorship.is_active(day(2)));
        assert!(sponsorship.is_active(day(3)));
        assert!(sponsorship.is_active(day(5)));
        assert!(!sponsorship.is_active(day(6)));
    }
}
