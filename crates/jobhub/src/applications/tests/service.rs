use chrono::Duration;

use super::common::hiring;
use crate::applications::{ApplicationError, ApplicationStatus};
use crate::entities::MemberRole;

#[test]
fn applying_records_history_and_notifies_owners() {
    let hiring = hiring();
    let applications = &hiring.world.platform.applications;

    let application = applications
        .apply(&hiring.candidate, &hiring.job.id, "  I love Rust.  ", hiring.world.today())
        .expect("applies");

    assert_eq!(application.status, ApplicationStatus::Submitted);
    assert_eq!(application.cover_letter, "I love Rust.");
    assert_eq!(application.entity_id, hiring.entity.id);
    assert_eq!(application.history.len(), 1);

    let notice = hiring
        .world
        .outbox
        .last_to("owner@acme.test", "application_received")
        .expect("owner notified");
    assert!(notice.body.contains("Rust Engineer"));
}

#[test]
fn one_application_per_job() {
    let hiring = hiring();
    let applications = &hiring.world.platform.applications;
    let today = hiring.world.today();

    applications
        .apply(&hiring.candidate, &hiring.job.id, "", today)
        .expect("applies");
    let err = applications
        .apply(&hiring.candidate, &hiring.job.id, "again", today)
        .expect_err("duplicate");
    assert!(matches!(err, ApplicationError::AlreadyApplied));
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}

#[test]
fn applicants_need_a_profile_and_an_open_job() {
    let hiring = hiring();
    let world = &hiring.world;
    let applications = &world.platform.applications;
    let today = world.today();

    let newcomer = world.candidate("new@example.com");
    assert!(matches!(
        applications.apply(&newcomer, &hiring.job.id, "", today),
        Err(ApplicationError::ProfileRequired)
    ));

    assert!(matches!(
        applications.apply(&hiring.owner, &hiring.job.id, "", today),
        Err(ApplicationError::CandidatesOnly)
    ));

    assert!(matches!(
        applications.apply(&hiring.candidate, &hiring.job.id, "", today + Duration::days(30)),
        Err(ApplicationError::JobNotOpen)
    ));

    world
        .platform
        .jobs
        .pause(&hiring.owner, &hiring.job.id)
        .expect("pauses");
    assert!(matches!(
        applications.apply(&hiring.candidate, &hiring.job.id, "", today),
        Err(ApplicationError::JobNotOpen)
    ));
}

#[test]
fn pipeline_advances_one_step_and_tells_the_candidate() {
    let hiring = hiring();
    let applications = &hiring.world.platform.applications;
    let application = applications
        .apply(&hiring.candidate, &hiring.job.id, "", hiring.world.today())
        .expect("applies");

    let err = applications
        .advance(&hiring.owner, &application.id, ApplicationStatus::Offered)
        .expect_err("cannot skip steps");
    assert!(matches!(
        err,
        ApplicationError::InvalidTransition {
            from: ApplicationStatus::Submitted,
            to: ApplicationStatus::Offered
        }
    ));

    for status in [
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Offered,
        ApplicationStatus::Hired,
    ] {
        applications
            .advance(&hiring.owner, &application.id, status)
            .expect("advances");
    }

    let hired = applications
        .get(&hiring.candidate, &application.id)
        .expect("visible to applicant");
    assert_eq!(hired.status, ApplicationStatus::Hired);
    assert_eq!(hired.history.len(), 5);

    let notice = hiring
        .world
        .outbox
        .last_to("ada@example.com", "application_status")
        .expect("candidate notified");
    assert!(notice.body.contains("hired"));

    assert!(matches!(
        applications.advance(&hiring.owner, &application.id, ApplicationStatus::Rejected),
        Err(ApplicationError::InvalidTransition { .. })
    ));
}

#[test]
fn withdrawal_is_for_the_applicant_while_open() {
    let hiring = hiring();
    let world = &hiring.world;
    let applications = &world.platform.applications;
    let application = applications
        .apply(&hiring.candidate, &hiring.job.id, "", world.today())
        .expect("applies");

    let other = world.candidate("other@example.com");
    assert!(matches!(
        applications.withdraw(&other, &application.id),
        Err(ApplicationError::NotFound)
    ));

    let withdrawn = applications
        .withdraw(&hiring.candidate, &application.id)
        .expect("withdraws");
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

    assert!(matches!(
        applications.withdraw(&hiring.candidate, &application.id),
        Err(ApplicationError::InvalidTransition { .. })
    ));
    assert!(matches!(
        applications.advance(&hiring.owner, &application.id, ApplicationStatus::Reviewing),
        Err(ApplicationError::InvalidTransition { .. })
    ));
}

#[test]
fn recruiters_see_applications_for_their_jobs_only() {
    let hiring = hiring();
    let world = &hiring.world;
    let applications = &world.platform.applications;
    let today = world.today();

    let second = world.candidate("grace@example.com");
    world.profile(&second, &["rust"], 1);
    applications
        .apply(&hiring.candidate, &hiring.job.id, "", today)
        .expect("applies");
    world.clock.advance_days(1);
    applications
        .apply(&second, &hiring.job.id, "", world.today())
        .expect("applies");

    let recruiter = world.employer("recruiter@acme.test");
    world
        .platform
        .entities
        .add_member(&hiring.owner, &hiring.entity.id, &recruiter.user_id, MemberRole::Recruiter)
        .expect("adds recruiter");

    let listed = applications
        .applications_for_job(&recruiter, &hiring.job.id)
        .expect("lists");
    let candidates: Vec<_> = listed.iter().map(|a| a.candidate_id).collect();
    assert_eq!(candidates, vec![hiring.candidate.user_id, second.user_id]);

    let outsider = world.employer("rival@other.test");
    assert!(applications
        .applications_for_job(&outsider, &hiring.job.id)
        .is_err());

    assert_eq!(
        applications.mine(&second).expect("lists").len(),
        1
    );
}
