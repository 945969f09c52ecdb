use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::jobs::query::listing_order;
use crate::jobs::Job;
use crate::profiles::JobProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecommendation {
    pub overlap: usize,
    pub sponsored: bool,
    pub job: Job,
}

/// Listed jobs the candidate qualifies for: every required skill is on the
/// profile and the experience requirement is met.
pub fn recommend_jobs(
    profile: &JobProfile,
    jobs: &[Job],
    today: NaiveDate,
) -> Vec<JobRecommendation> {
    let skills: HashSet<&str> = profile.skills.iter().map(String::as_str).collect();
    let years = profile.total_experience_years(today);

    let mut recommendations: Vec<JobRecommendation> = jobs
        .iter()
        .filter(|job| job.is_listed(today))
        .filter(|job| {
            let requirements = &job.requirements;
            requirements.min_experience_years <= years
                && requirements
                    .skills
                    .iter()
                    .all(|skill| skills.contains(skill.as_str()))
        })
        .map(|job| {
            let requirements = &job.requirements;
            let overlap = requirements
                .skills
                .iter()
                .chain(requirements.preferred_skills.iter())
                .filter(|skill| skills.contains(skill.as_str()))
                .count();
            JobRecommendation {
                overlap,
                sponsored: job.is_sponsored(today),
                job: job.clone(),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.overlap
            .cmp(&a.overlap)
            .then_with(|| listing_order(&a.job, &b.job, today))
    });
    recommendations
}
