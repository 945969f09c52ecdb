use chrono::Duration;

use super::common::company;
use crate::billing::{BillingError, ChargeReceipt};
use crate::entities::EntityError;
use crate::jobs::{JobAction, JobError, JobStatus};
use crate::test_support::{job_draft, world};

#[test]
fn drafts_normalise_skills_and_require_a_title() {
    let company = company();
    let jobs = &company.world.platform.jobs;

    let job = jobs
        .create_draft(
            &company.owner,
            &company.entity.id,
            job_draft("Platform Engineer", &[" Rust", "rust", "Kubernetes "]),
        )
        .expect("drafts");
    assert_eq!(job.status, JobStatus::Draft);
    assert_eq!(job.requirements.skills, vec!["rust", "kubernetes"]);

    let err = jobs
        .create_draft(&company.owner, &company.entity.id, job_draft("   ", &[]))
        .expect_err("blank title");
    assert!(matches!(err, JobError::MissingTitle));
}

#[test]
fn outsiders_cannot_draft_for_an_entity() {
    let company = company();
    let stranger = company.world.employer("stranger@elsewhere.test");

    let err = company
        .world
        .platform
        .jobs
        .create_draft(&stranger, &company.entity.id, job_draft("Spy", &[]))
        .expect_err("not a member");
    assert!(matches!(err, JobError::Entity(EntityError::InsufficientRole(_))));
}

#[test]
fn publishing_charges_a_credit_and_opens_the_window() {
    let company = company();
    let today = company.world.today();

    let job = company.published("Rust Engineer");

    assert_eq!(job.status, JobStatus::Published);
    assert_eq!(job.published_on, Some(today));
    assert_eq!(job.expires_on, Some(today + Duration::days(30)));
    assert_eq!(
        job.publication_charge,
        Some(ChargeReceipt::Credits { credits: 1 })
    );
    assert_eq!(company.credits(), 19);
}

#[test]
fn subscription_postings_are_used_before_credits() {
    let company = company();
    company
        .world
        .buy(&company.owner, &company.entity.id, "monthly-10");

    let job = company.published("Rust Engineer");

    assert!(matches!(
        job.publication_charge,
        Some(ChargeReceipt::Subscription { .. })
    ));
    assert_eq!(company.credits(), 20);
    let subscription = company
        .world
        .platform
        .billing
        .subscription(&company.owner, &company.entity.id)
        .expect("readable")
        .expect("active");
    assert_eq!(subscription.postings_used, 1);
}

#[test]
fn publishing_without_credits_leaves_the_draft_untouched() {
    let world = world();
    let owner = world.employer("broke@acme.test");
    let entity = world.entity(&owner, "Broke Inc");
    let draft = world
        .platform
        .jobs
        .create_draft(&owner, &entity.id, job_draft("Unpaid", &[]))
        .expect("drafts");

    let err = world
        .platform
        .jobs
        .publish(&owner, &draft.id, world.today())
        .expect_err("no credits");
    assert!(matches!(
        err,
        JobError::Billing(BillingError::InsufficientCredits {
            required: 1,
            available: 0
        })
    ));
    assert_eq!(err.status_code(), axum::http::StatusCode::PAYMENT_REQUIRED);

    let stored = world.platform.jobs.find(&draft.id).expect("stored");
    assert_eq!(stored.status, JobStatus::Draft);
}

#[test]
fn illegal_transitions_name_the_action() {
    let company = company();
    let draft = company.draft("Rust Engineer");

    let err = company
        .world
        .platform
        .jobs
        .pause(&company.owner, &draft.id)
        .expect_err("drafts cannot pause");
    match err {
        JobError::InvalidTransition { from, action } => {
            assert_eq!(from, JobStatus::Draft);
            assert_eq!(action, JobAction::Pause);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn published_jobs_cannot_be_edited_until_paused() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let job = company.published("Rust Engineer");

    assert!(matches!(
        jobs.update(&company.owner, &job.id, job_draft("Renamed", &[])),
        Err(JobError::InvalidTransition { .. })
    ));

    jobs.pause(&company.owner, &job.id).expect("pauses");
    let updated = jobs
        .update(&company.owner, &job.id, job_draft("Renamed", &["go"]))
        .expect("paused jobs are editable");
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.status, JobStatus::Paused);
}

#[test]
fn resume_is_refused_once_the_window_has_passed() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let job = company.published("Rust Engineer");
    jobs.pause(&company.owner, &job.id).expect("pauses");

    let later = company.world.today() + Duration::days(31);
    let err = jobs
        .resume(&company.owner, &job.id, later)
        .expect_err("window closed");
    assert!(matches!(err, JobError::ListingExpired(_)));

    let resumed = jobs
        .resume(&company.owner, &job.id, company.world.today())
        .expect("still open");
    assert_eq!(resumed.status, JobStatus::Published);
}

#[test]
fn sponsorship_charges_per_day_and_extends_from_its_end() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let today = company.world.today();
    let job = company.published("Rust Engineer");

    let job = jobs
        .sponsor(&company.owner, &job.id, 5, today)
        .expect("sponsors");
    let sponsorship = job.sponsorship.clone().expect("sponsored");
    assert_eq!(sponsorship.starts_on, today);
    assert_eq!(sponsorship.ends_on, today + Duration::days(5));
    assert!(job.is_sponsored(today));
    assert_eq!(company.credits(), 14);

    let job = jobs
        .sponsor(&company.owner, &job.id, 3, today + Duration::days(2))
        .expect("extends");
    let sponsorship = job.sponsorship.expect("sponsored");
    assert_eq!(sponsorship.starts_on, today);
    assert_eq!(sponsorship.ends_on, today + Duration::days(8));
    assert_eq!(sponsorship.credits, 8);
    assert_eq!(company.credits(), 11);
}

#[test]
fn sponsorship_may_not_outlive_the_listing() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let today = company.world.today();
    let job = company.published("Rust Engineer");

    let err = jobs
        .sponsor(&company.owner, &job.id, 31, today)
        .expect_err("beyond expiry");
    assert!(matches!(err, JobError::SponsorshipBeyondExpiry { .. }));
    assert_eq!(company.credits(), 19);

    assert!(matches!(
        jobs.sponsor(&company.owner, &job.id, 0, today),
        Err(JobError::InvalidSponsorshipDays)
    ));

    let draft = company.draft("Not yet live");
    assert!(matches!(
        jobs.sponsor(&company.owner, &draft.id, 1, today),
        Err(JobError::InvalidTransition { .. })
    ));
}

#[test]
fn closing_refunds_unused_sponsorship_days() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let today = company.world.today();
    let job = company.published("Rust Engineer");
    jobs.sponsor(&company.owner, &job.id, 10, today)
        .expect("sponsors");
    assert_eq!(company.credits(), 9);

    let closed = jobs
        .close(&company.owner, &job.id, today + Duration::days(3))
        .expect("closes");

    let sponsorship = closed.sponsorship.expect("kept for the record");
    assert_eq!(closed.status, JobStatus::Closed);
    assert_eq!(sponsorship.ends_on, today + Duration::days(4));
    assert_eq!(sponsorship.credits, 4);
    assert_eq!(company.credits(), 15);
}

#[test]
fn expiry_sweep_then_renewal_charges_again() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let today = company.world.today();
    let live = company.published("Rust Engineer");
    let paused = company.published("Go Engineer");
    jobs.pause(&company.owner, &paused.id).expect("pauses");
    let draft = company.draft("Still drafting");

    assert!(jobs
        .expire_due(today + Duration::days(29))
        .expect("sweeps")
        .is_empty());

    let later = today + Duration::days(30);
    let mut expired = jobs.expire_due(later).expect("sweeps");
    expired.sort();
    let mut expected = vec![live.id, paused.id];
    expected.sort();
    assert_eq!(expired, expected);
    assert_eq!(
        jobs.find(&draft.id).expect("stored").status,
        JobStatus::Draft
    );

    let credits_before = company.credits();
    let renewed = jobs
        .renew(&company.owner, &live.id, later)
        .expect("renews");
    assert_eq!(renewed.status, JobStatus::Published);
    assert_eq!(renewed.expires_on, Some(later + Duration::days(30)));
    assert_eq!(company.credits(), credits_before - 1);
}

#[test]
fn csv_import_is_all_or_nothing() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let header = "title,description,location,employment_type,workplace,skills,min_experience_years,salary_min,salary_max\n";

    let broken = format!(
        "{header}Rust Engineer,,Berlin,full_time,remote,rust,2,,\n\
         ,,Berlin,full_time,remote,rust,,,\n\
         Salary Mixup,,Berlin,contract,remote,,,90000,50000\n\
         Gig Worker,,Berlin,gig,remote,rust,,,\n"
    );
    match jobs.import_csv(&company.owner, &company.entity.id, broken.as_bytes()) {
        Err(JobError::Import(crate::jobs::ImportError::Rows(rows))) => {
            let lines: Vec<u64> = rows.iter().map(|r| r.line).collect();
            assert_eq!(lines, vec![3, 4, 5]);
            assert!(rows[2].message.contains("employment type"));
        }
        other => panic!("expected row errors, got {other:?}"),
    }
    assert!(jobs
        .jobs_for_entity(&company.owner, &company.entity.id)
        .expect("lists")
        .is_empty());

    let valid = format!(
        "{header}Rust Engineer,,Berlin,full_time,remote,rust;tokio,2,,\n\
         Data Intern,,Munich,internship,on_site,sql,,,\n"
    );
    let imported = jobs
        .import_csv(&company.owner, &company.entity.id, valid.as_bytes())
        .expect("imports");
    assert_eq!(imported.len(), 2);
    assert!(imported.iter().all(|job| job.status == JobStatus::Draft));
}
