use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{EmploymentType, Job, Workplace};
use crate::skills::normalize_skill;

pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Filters for the public job listing. Absent fields do not constrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub workplace: Option<Workplace>,
    #[serde(default)]
    pub min_salary: Option<u32>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            location: None,
            employment_type: None,
            workplace: None,
            min_salary: None,
            skill: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: u32,
}

impl JobQuery {
    pub fn has_valid_paging(&self) -> bool {
        self.page >= 1 && (1..=MAX_PER_PAGE).contains(&self.per_page)
    }

    pub fn matches(&self, job: &Job) -> bool {
        if let Some(keyword) = lowered(&self.keyword) {
            let in_title = job.title.to_lowercase().contains(&keyword);
            if !in_title && !job.description.to_lowercase().contains(&keyword) {
                return false;
            }
        }

        if let Some(location) = lowered(&self.location) {
            if !job.location.to_lowercase().contains(&location) {
                return false;
            }
        }

        if self.employment_type.is_some_and(|t| t != job.employment_type) {
            return false;
        }
        if self.workplace.is_some_and(|w| w != job.workplace) {
            return false;
        }

        if let Some(min_salary) = self.min_salary {
            match &job.salary {
                Some(salary) if salary.max >= min_salary => {}
                _ => return false,
            }
        }

        if let Some(skill) = self.skill.as_deref().and_then(normalize_skill) {
            let requirements = &job.requirements;
            if !requirements.skills.contains(&skill)
                && !requirements.preferred_skills.contains(&skill)
            {
                return false;
            }
        }

        true
    }

    /// Filter listed jobs, rank them and cut out the requested page.
    pub fn apply(&self, jobs: Vec<Job>, today: NaiveDate) -> Page<Job> {
        let mut matching: Vec<Job> = jobs
            .into_iter()
            .filter(|job| job.is_listed(today) && self.matches(job))
            .collect();
        matching.sort_by(|a, b| listing_order(a, b, today));

        let total = matching.len();
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        let page = self.page.max(1);
        let total_pages = u32::try_from(total.div_ceil(per_page as usize)).unwrap_or(u32::MAX);
        let items = matching
            .into_iter()
            .skip((page as usize - 1) * per_page as usize)
            .take(per_page as usize)
            .collect();

        Page {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Sponsored first, then most recently published, newest created, id.
pub fn listing_order(a: &Job, b: &Job, today: NaiveDate) -> Ordering {
    b.is_sponsored(today)
        .cmp(&a.is_sponsored(today))
        .then_with(|| b.published_on.cmp(&a.published_on))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.0.cmp(&b.id.0))
}

fn lowered(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}
