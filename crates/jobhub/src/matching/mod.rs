//! Candidate search and job recommendations.
//!
//! Search works on sets of user ids: every active criterion of a
//! [`CandidateFilter`] yields the set of candidates satisfying it and the
//! result is their intersection. Ranking happens afterwards.

pub mod filter;
pub mod recommend;
pub mod router;
pub mod search;
pub mod service;

pub use filter::CandidateFilter;
pub use recommend::{recommend_jobs, JobRecommendation};
pub use router::matching_router;
pub use search::{match_candidates_for_job, search_candidates, CandidateMatch};
pub use service::{CandidateSearchService, MatchingError};
