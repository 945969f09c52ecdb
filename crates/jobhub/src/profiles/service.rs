use std::sync::Arc;

use axum::http::StatusCode;
use tracing::info;

use super::domain::{JobProfile, ProfileDraft};
use super::repository::ProfileRepository;
use crate::accounts::{AccountError, AccountService, AccountStatus, AuthenticatedUser, Role};
use crate::clock::Clock;
use crate::ids::UserId;
use crate::skills::normalize_skills;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("only candidate accounts have job profiles")]
    CandidatesOnly,
    #[error("profile headline must not be empty")]
    MissingHeadline,
    #[error("experience entry {index} ends before it starts")]
    InvalidExperience { index: usize },
    #[error("education entry {index} ends before it starts")]
    InvalidEducation { index: usize },
    #[error("profile not found")]
    NotFound,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ProfileError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProfileError::CandidatesOnly => StatusCode::FORBIDDEN,
            ProfileError::MissingHeadline
            | ProfileError::InvalidExperience { .. }
            | ProfileError::InvalidEducation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ProfileError::NotFound | ProfileError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ProfileError::Account(err) => err.status_code(),
            ProfileError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    accounts: Arc<AccountService>,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        accounts: Arc<AccountService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            accounts,
            clock,
        }
    }

    /// Create or replace the caller's profile.
    pub fn upsert(
        &self,
        actor: &AuthenticatedUser,
        draft: ProfileDraft,
    ) -> Result<JobProfile, ProfileError> {
        require_candidate(actor)?;

        let headline = draft.headline.trim().to_string();
        if headline.is_empty() {
            return Err(ProfileError::MissingHeadline);
        }
        if let Some(index) = draft
            .experience
            .iter()
            .position(|e| e.end.is_some_and(|end| end < e.start))
        {
            return Err(ProfileError::InvalidExperience { index });
        }
        if let Some(index) = draft
            .education
            .iter()
            .position(|e| e.end_year.is_some_and(|end| end < e.start_year))
        {
            return Err(ProfileError::InvalidEducation { index });
        }

        let mut experience = draft.experience;
        experience.sort_by(|a, b| b.start.cmp(&a.start));
        let mut desired_employment = Vec::new();
        for kind in draft.desired_employment {
            if !desired_employment.contains(&kind) {
                desired_employment.push(kind);
            }
        }

        let profile = JobProfile {
            user_id: actor.user_id,
            headline,
            summary: draft.summary.trim().to_string(),
            location: draft.location.trim().to_string(),
            skills: normalize_skills(&draft.skills),
            education: draft.education,
            experience,
            desired_employment,
            open_to_work: draft.open_to_work,
            updated_at: self.clock.now(),
        };

        self.profiles.upsert(profile.clone())?;
        info!(user_id = %actor.user_id, skills = profile.skills.len(), "profile saved");
        Ok(profile)
    }

    pub fn mine(&self, actor: &AuthenticatedUser) -> Result<JobProfile, ProfileError> {
        require_candidate(actor)?;
        self.profiles
            .fetch(&actor.user_id)?
            .ok_or(ProfileError::NotFound)
    }

    /// Owners and administrators always see a profile; everyone else only
    /// while the candidate is open to work.
    pub fn get(
        &self,
        viewer: &AuthenticatedUser,
        user: &UserId,
    ) -> Result<JobProfile, ProfileError> {
        let profile = self.profiles.fetch(user)?.ok_or(ProfileError::NotFound)?;
        if viewer.user_id == *user || viewer.is_admin() || profile.open_to_work {
            Ok(profile)
        } else {
            Err(ProfileError::NotFound)
        }
    }

    pub fn set_open_to_work(
        &self,
        actor: &AuthenticatedUser,
        open: bool,
    ) -> Result<JobProfile, ProfileError> {
        let mut profile = self.mine(actor)?;
        profile.open_to_work = open;
        profile.updated_at = self.clock.now();
        self.profiles.upsert(profile.clone())?;
        info!(user_id = %actor.user_id, open, "open-to-work changed");
        Ok(profile)
    }

    /// Profiles that take part in candidate search: open to work and owned
    /// by an active account.
    pub fn searchable(&self) -> Result<Vec<JobProfile>, ProfileError> {
        let mut searchable = Vec::new();
        for profile in self.profiles.open_to_work()? {
            match self.accounts.contact(&profile.user_id) {
                Ok(user) if user.status == AccountStatus::Active => searchable.push(profile),
                Ok(_) | Err(AccountError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(searchable)
    }
}

fn require_candidate(actor: &AuthenticatedUser) -> Result<(), ProfileError> {
    if actor.role == Role::Candidate {
        Ok(())
    } else {
        Err(ProfileError::CandidatesOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{Education, Experience};
    use crate::test_support::{date, profile_draft, world};

    #[test]
    fn upsert_normalises_and_orders_experience() {
        let world = world();
        let candidate = world.candidate("ada@example.com");
        let mut draft = profile_draft(&["Rust", " rust ", "SQL"]);
        draft.headline = "  Systems engineer ".to_string();
        draft.experience = vec![
            Experience {
                title: "Junior".to_string(),
                company: "First".to_string(),
                start: date(2018, 1, 1),
                end: Some(date(2020, 1, 1)),
                description: String::new(),
            },
            Experience {
                title: "Senior".to_string(),
                company: "Second".to_string(),
                start: date(2020, 1, 1),
                end: None,
                description: String::new(),
            },
        ];

        let profile = world
            .platform
            .profiles
            .upsert(&candidate, draft)
            .expect("saves");
        assert_eq!(profile.headline, "Systems engineer");
        assert_eq!(profile.skills, vec!["rust", "sql"]);
        assert_eq!(profile.experience[0].title, "Senior");
        assert_eq!(profile.total_experience_years(world.today()), 7);
    }

    #[test]
    fn invalid_ranges_point_at_the_entry() {
        let world = world();
        let candidate = world.candidate("ada@example.com");
        let profiles = &world.platform.profiles;

        let mut draft = profile_draft(&["rust"]);
        draft.education = vec![Education {
            institution: "TU".to_string(),
            degree: crate::profiles::DegreeLevel::Bachelor,
            field: "CS".to_string(),
            start_year: 2015,
            end_year: Some(2012),
        }];
        assert!(matches!(
            profiles.upsert(&candidate, draft),
            Err(ProfileError::InvalidEducation { index: 0 })
        ));

        let mut draft = profile_draft(&["rust"]);
        draft.headline = " ".to_string();
        assert!(matches!(
            profiles.upsert(&candidate, draft),
            Err(ProfileError::MissingHeadline)
        ));

        let employer = world.employer("boss@acme.test");
        assert!(matches!(
            profiles.upsert(&employer, profile_draft(&[])),
            Err(ProfileError::CandidatesOnly)
        ));
    }

    #[test]
    fn closed_profiles_are_private() {
        let world = world();
        let candidate = world.candidate("ada@example.com");
        let recruiter = world.employer("recruiter@acme.test");
        let admin = world.user("ops@jobhub.test", Role::Admin);
        let profiles = &world.platform.profiles;
        world.profile(&candidate, &["rust"], 1);

        assert!(profiles.get(&recruiter, &candidate.user_id).is_ok());

        profiles
            .set_open_to_work(&candidate, false)
            .expect("toggles");
        assert!(matches!(
            profiles.get(&recruiter, &candidate.user_id),
            Err(ProfileError::NotFound)
        ));
        assert!(profiles.get(&candidate, &candidate.user_id).is_ok());
        assert!(profiles.get(&admin, &candidate.user_id).is_ok());
        assert!(profiles.searchable().expect("lists").is_empty());
    }
}
