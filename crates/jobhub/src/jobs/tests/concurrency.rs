use std::sync::Barrier;
use std::thread;

use chrono::Duration;

use super::common::company;
use crate::jobs::JobError;

#[test]
fn racing_publishes_charge_the_draft_once() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let owner = company.owner;
    let today = company.world.today();

    for round in 0..8 {
        let draft = company.draft(&format!("Rust Engineer {round}"));
        let before = company.credits();
        let barrier = &Barrier::new(2);
        let id = draft.id;

        let outcomes: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    scope.spawn(move || {
                        barrier.wait();
                        jobs.publish(&owner, &id, today)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread finishes"))
                .collect()
        });

        assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(JobError::InvalidTransition { .. }))));
        assert_eq!(company.credits(), before - 1);
    }
}

#[test]
fn racing_sponsorships_both_extend_the_same_window() {
    let company = company();
    let jobs = &company.world.platform.jobs;
    let owner = company.owner;
    let today = company.world.today();
    let job = company.published("Rust Engineer");
    assert_eq!(company.credits(), 19);

    let barrier = &Barrier::new(2);
    let id = job.id;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(move || {
                    barrier.wait();
                    jobs.sponsor(&owner, &id, 5, today)
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread finishes").expect("sponsors");
        }
    });

    let job = jobs.find(&id).expect("stored");
    let sponsorship = job.sponsorship.expect("sponsored");
    assert_eq!(sponsorship.ends_on, today + Duration::days(10));
    assert_eq!(sponsorship.credits, 10);
    assert_eq!(company.credits(), 9);
}
