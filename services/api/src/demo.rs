use crate::cli::format_price;
use crate::infra::wire_platform;
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use jobhub::accounts::{AuthenticatedUser, RegistrationRequest, Role};
use jobhub::applications::ApplicationStatus;
use jobhub::clock::{Clock, ManualClock};
use jobhub::config::AppConfig;
use jobhub::entities::NewEntity;
use jobhub::error::AppError;
use jobhub::http::Authenticator;
use jobhub::jobs::{EmploymentType, JobDraft, JobQuery, JobRequirements, SalaryRange, Workplace};
use jobhub::notify::{extract_code, Channel, RecordingNotifier};
use jobhub::profiles::{DegreeLevel, Education, Experience, ProfileDraft};
use jobhub::Platform;
use std::sync::Arc;

const DEMO_PASSWORD: &str = "demo-password-2025";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Starting date of the walk-through (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Days to sponsor the first posting for.
    #[arg(long, default_value_t = 7)]
    pub(crate) sponsor_days: u32,
    /// Print every notification the platform sent at the end.
    #[arg(long)]
    pub(crate) show_outbox: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        sponsor_days,
        show_outbox,
    } = args;

    let config = AppConfig::load()?;
    let start = today.unwrap_or_else(|| Local::now().date_naive());
    let clock = Arc::new(ManualClock::at_date(start));
    let outbox = RecordingNotifier::default();
    let platform = wire_platform(&config, Arc::new(outbox.clone()), clock.clone());

    println!("Job board demo starting {start}");

    let employer = sign_up(
        &platform,
        &outbox,
        "hiring@northwind.test",
        "Nadia Owner",
        Role::Employer,
    )?;
    let candidate = sign_up(
        &platform,
        &outbox,
        "ada@example.com",
        "Ada Candidate",
        Role::Candidate,
    )?;
    println!("- registered and verified an employer and a candidate");

    let entity = platform
        .entities
        .create(
            &employer,
            NewEntity {
                name: "Northwind Logistics".to_string(),
                industry: Some("Logistics".to_string()),
                ..NewEntity::default()
            },
        )
        .map_err(AppError::workflow)?;
    let order = platform
        .billing
        .purchase(&employer, &entity.id, "growth-20")
        .map_err(AppError::workflow)?;
    println!(
        "- {} ({}) bought {} for {}",
        entity.name,
        entity.slug,
        order.plan_code,
        format_price(order.amount_cents)
    );

    let drafts = [
        demo_job("Senior Rust Engineer", &["rust", "tokio", "postgres"], 4),
        demo_job("Data Engineer", &["python", "sql", "airflow"], 2),
    ];
    let mut jobs = Vec::new();
    for draft in drafts {
        let job = platform
            .jobs
            .create_draft(&employer, &entity.id, draft)
            .map_err(AppError::workflow)?;
        let job = platform
            .jobs
            .publish(&employer, &job.id, clock.today())
            .map_err(AppError::workflow)?;
        jobs.push(job);
    }
    let sponsored = platform
        .jobs
        .sponsor(&employer, &jobs[0].id, sponsor_days, clock.today())
        .map_err(AppError::workflow)?;
    let wallet = platform
        .billing
        .wallet(&employer, &entity.id)
        .map_err(AppError::workflow)?;
    println!(
        "- published {} postings, sponsored '{}' for {} days; {} credits left",
        jobs.len(),
        sponsored.title,
        sponsor_days,
        wallet.credits
    );

    platform
        .profiles
        .upsert(&candidate, demo_profile(start))
        .map_err(AppError::workflow)?;
    let recommendations = platform
        .search
        .recommendations(&candidate)
        .map_err(AppError::workflow)?;
    println!("Recommended for the candidate:");
    for recommendation in &recommendations {
        println!(
            "  - {} (overlap {}{})",
            recommendation.job.title,
            recommendation.overlap,
            if recommendation.sponsored { ", sponsored" } else { "" }
        );
    }

    let listing = platform
        .jobs
        .public_listing(&JobQuery::default(), clock.today())
        .map_err(AppError::workflow)?;
    println!("Public listing ({} open):", listing.total);
    for job in &listing.items {
        println!("  - {} [{}]", job.title, job.status.label());
    }

    let application = platform
        .applications
        .apply(
            &candidate,
            &jobs[0].id,
            "Eight years of async Rust in production.",
            clock.today(),
        )
        .map_err(AppError::workflow)?;
    for status in [ApplicationStatus::Reviewing, ApplicationStatus::Shortlisted] {
        platform
            .applications
            .advance(&employer, &application.id, status)
            .map_err(AppError::workflow)?;
    }
    let application = platform
        .applications
        .get(&candidate, &application.id)
        .map_err(AppError::workflow)?;
    println!(
        "- candidate applied to '{}'; application is {} after {} steps",
        jobs[0].title,
        application.status.label(),
        application.history.len()
    );

    platform
        .messaging
        .send(
            &employer,
            &candidate.user_id,
            "Thanks for applying, are you free for a call on Thursday?",
        )
        .map_err(AppError::workflow)?;
    platform
        .messaging
        .send(&candidate, &employer.user_id, "Thursday works, talk then.")
        .map_err(AppError::workflow)?;
    let inbox = platform
        .messaging
        .conversations(&employer)
        .map_err(AppError::workflow)?;
    println!(
        "- employer inbox: {} conversation(s), {} unread",
        inbox.len(),
        inbox.iter().map(|summary| summary.unread).sum::<usize>()
    );

    clock.advance_days(i64::from(config.marketplace.listing_days));
    let report = platform
        .run_maintenance(clock.today())
        .map_err(AppError::workflow)?;
    println!(
        "- after {} days the sweep expired {} posting(s) and purged {} stale code(s)",
        config.marketplace.listing_days,
        report.expired_jobs.len(),
        report.purged_codes
    );

    let deliveries = outbox.deliveries();
    println!("Notifications sent: {}", deliveries.len());
    if show_outbox {
        for notification in deliveries {
            println!(
                "  - [{}] {} -> {}",
                notification.channel.label(),
                notification.template,
                notification.destination
            );
        }
    }

    Ok(())
}

/// Register, confirm the e-mailed code and log in the way a client would.
fn sign_up(
    platform: &Platform,
    outbox: &RecordingNotifier,
    email: &str,
    full_name: &str,
    role: Role,
) -> Result<AuthenticatedUser, AppError> {
    platform
        .accounts
        .register(RegistrationRequest {
            email: email.to_string(),
            phone: None,
            full_name: full_name.to_string(),
            password: DEMO_PASSWORD.to_string(),
            role,
        })
        .map_err(AppError::workflow)?;

    let code = outbox
        .last_to(email, "otp_verification")
        .and_then(|notification| extract_code(&notification.body))
        .ok_or_else(|| {
            AppError::Workflow(format!("no verification code was sent to {email}").into())
        })?;
    platform
        .accounts
        .verify_otp(email, Channel::Email, &code)
        .map_err(AppError::workflow)?;

    let login = platform
        .accounts
        .login(email, DEMO_PASSWORD)
        .map_err(AppError::workflow)?;
    platform
        .accounts
        .authenticate(&login.token)
        .map_err(AppError::workflow)
}

fn demo_job(title: &str, skills: &[&str], min_experience_years: u32) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: format!("{title} for our routing platform."),
        location: "Rotterdam".to_string(),
        employment_type: EmploymentType::FullTime,
        workplace: Workplace::Hybrid,
        requirements: JobRequirements {
            skills: skills.iter().map(|skill| skill.to_string()).collect(),
            min_experience_years,
            ..JobRequirements::default()
        },
        salary: Some(SalaryRange {
            min: 70_000,
            max: 95_000,
            currency: "EUR".to_string(),
        }),
    }
}

fn demo_profile(today: NaiveDate) -> ProfileDraft {
    let years_ago = |years: i32| today.with_year(today.year() - years).unwrap_or(today);
    ProfileDraft {
        headline: "Backend engineer, distributed systems".to_string(),
        summary: "Builds reliable services in Rust.".to_string(),
        location: "Rotterdam".to_string(),
        skills: vec![
            "Rust".to_string(),
            "Tokio".to_string(),
            "Postgres".to_string(),
            "Kubernetes".to_string(),
        ],
        education: vec![Education {
            institution: "TU Delft".to_string(),
            degree: DegreeLevel::Master,
            field: "Computer Science".to_string(),
            start_year: today.year() - 12,
            end_year: Some(today.year() - 10),
        }],
        experience: vec![Experience {
            title: "Software Engineer".to_string(),
            company: "Harbour Systems".to_string(),
            start: years_ago(8),
            end: None,
            description: String::new(),
        }],
        desired_employment: vec![EmploymentType::FullTime],
        open_to_work: true,
    }
}
