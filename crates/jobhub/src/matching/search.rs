use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::CandidateFilter;
use crate::ids::UserId;
use crate::jobs::Job;
use crate::profiles::{DegreeLevel, JobProfile};

const SKILL_WEIGHT: u32 = 10;
const PREFERRED_SKILL_WEIGHT: u32 = 5;
const EXPERIENCE_CAP: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateMatch {
    pub user_id: UserId,
    pub score: u32,
    pub matched_skills: Vec<String>,
    pub experience_years: u32,
    pub highest_degree: DegreeLevel,
    pub profile: JobProfile,
}

type IdSet = BTreeSet<UserId>;

/// Filter open-to-work profiles and rank the survivors by matched skills
/// and (capped) experience.
pub fn search_candidates(
    profiles: &[JobProfile],
    filter: &CandidateFilter,
    today: NaiveDate,
) -> Vec<CandidateMatch> {
    let filter = filter.normalized();
    let pool: HashMap<UserId, &JobProfile> = profiles
        .iter()
        .filter(|p| p.open_to_work)
        .map(|p| (p.user_id, p))
        .collect();
    let experience: HashMap<UserId, u32> = pool
        .values()
        .map(|p| (p.user_id, p.total_experience_years(today)))
        .collect();

    let mut selected: IdSet = pool.keys().copied().collect();
    for criterion in criteria(&pool, &experience, &filter) {
        selected = selected.intersection(&criterion).copied().collect();
        if selected.is_empty() {
            return Vec::new();
        }
    }

    let wanted: Vec<&String> = filter
        .skills_all
        .iter()
        .chain(filter.skills_any.iter())
        .collect();

    let mut matches: Vec<CandidateMatch> = selected
        .into_iter()
        .filter_map(|id| pool.get(&id).copied())
        .map(|profile| {
            let matched_skills: Vec<String> = wanted
                .iter()
                .filter(|skill| profile.skills.contains(**skill))
                .map(|skill| skill.to_string())
                .collect();
            let experience_years = experience
                .get(&profile.user_id)
                .copied()
                .unwrap_or_default();
            CandidateMatch {
                user_id: profile.user_id,
                score: matched_skills.len() as u32 * SKILL_WEIGHT
                    + experience_years.min(EXPERIENCE_CAP),
                matched_skills,
                experience_years,
                highest_degree: profile.highest_degree(),
                profile: profile.clone(),
            }
        })
        .collect();

    rank(&mut matches);
    matches
}

/// Candidates meeting a job's hard requirements, with preferred skills
/// adding to the score.
pub fn match_candidates_for_job(
    job: &Job,
    profiles: &[JobProfile],
    today: NaiveDate,
) -> Vec<CandidateMatch> {
    let mut matches = search_candidates(profiles, &CandidateFilter::for_job(job), today);

    for candidate in &mut matches {
        let preferred: Vec<String> = job
            .requirements
            .preferred_skills
            .iter()
            .filter(|skill| candidate.profile.skills.contains(*skill))
            .cloned()
            .collect();
        candidate.score += preferred.len() as u32 * PREFERRED_SKILL_WEIGHT;
        candidate.matched_skills.extend(preferred);
    }

    rank(&mut matches);
    matches
}

fn rank(matches: &mut [CandidateMatch]) {
    matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.user_id.cmp(&b.user_id)));
}

/// One id set per active criterion of the filter.
fn criteria(
    pool: &HashMap<UserId, &JobProfile>,
    experience: &HashMap<UserId, u32>,
    filter: &CandidateFilter,
) -> Vec<IdSet> {
    let ids_where = |predicate: &dyn Fn(&JobProfile) -> bool| -> IdSet {
        pool.values()
            .filter(|p| predicate(p))
            .map(|p| p.user_id)
            .collect()
    };

    let mut skill_index: HashMap<&str, IdSet> = HashMap::new();
    for profile in pool.values() {
        for skill in &profile.skills {
            skill_index
                .entry(skill.as_str())
                .or_default()
                .insert(profile.user_id);
        }
    }
    let holders = |skill: &String| -> IdSet {
        skill_index
            .get(skill.as_str())
            .cloned()
            .unwrap_or_default()
    };

    let mut sets: Vec<IdSet> = filter.skills_all.iter().map(holders).collect();

    if !filter.skills_any.is_empty() {
        sets.push(filter.skills_any.iter().flat_map(holders).collect());
    }

    if let Some(location) = &filter.location {
        sets.push(ids_where(&|p| p.location.to_lowercase().contains(location)));
    }

    if let Some(min_years) = filter.min_experience_years {
        sets.push(
            experience
                .iter()
                .filter(|(_, years)| **years >= min_years)
                .map(|(id, _)| *id)
                .collect(),
        );
    }

    if let Some(min_degree) = filter.min_degree {
        sets.push(ids_where(&|p| p.highest_degree() >= min_degree));
    }

    if let Some(kind) = filter.employment_type {
        sets.push(ids_where(&|p| {
            p.desired_employment.is_empty() || p.desired_employment.contains(&kind)
        }));
    }

    if let Some(keyword) = &filter.keyword {
        sets.push(ids_where(&|p| {
            p.headline.to_lowercase().contains(keyword)
                || p.summary.to_lowercase().contains(keyword)
                || p
                    .experience
                    .iter()
                    .any(|e| e.title.to_lowercase().contains(keyword))
        }));
    }

    sets
}
