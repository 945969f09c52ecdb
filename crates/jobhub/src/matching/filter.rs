use serde::{Deserialize, Serialize};

use crate::jobs::{EmploymentType, Job};
use crate::profiles::DegreeLevel;
use crate::skills::normalize_skills;

/// Criteria for candidate search. Empty lists and `None` do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilter {
    #[serde(default)]
    pub skills_all: Vec<String>,
    #[serde(default)]
    pub skills_any: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_experience_years: Option<u32>,
    #[serde(default)]
    pub min_degree: Option<DegreeLevel>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub keyword: Option<String>,
}

impl CandidateFilter {
    /// Canonical skills and trimmed, lowercased free-text fields.
    pub fn normalized(&self) -> Self {
        Self {
            skills_all: normalize_skills(&self.skills_all),
            skills_any: normalize_skills(&self.skills_any),
            location: lowered(self.location.as_deref()),
            min_experience_years: self.min_experience_years.filter(|years| *years > 0),
            min_degree: self.min_degree.filter(|degree| *degree > DegreeLevel::None),
            employment_type: self.employment_type,
            keyword: lowered(self.keyword.as_deref()),
        }
    }

    /// Hard requirements of a job: required skills, experience, education
    /// and employment type.
    pub fn for_job(job: &Job) -> Self {
        let requirements = &job.requirements;
        Self {
            skills_all: requirements.skills.clone(),
            skills_any: Vec::new(),
            location: None,
            min_experience_years: Some(requirements.min_experience_years),
            min_degree: Some(requirements.education),
            employment_type: Some(job.employment_type),
            keyword: None,
        }
        .normalized()
    }
}

fn lowered(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}
