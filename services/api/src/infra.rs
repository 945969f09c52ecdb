use jobhub::billing::SandboxGateway;
use jobhub::clock::Clock;
use jobhub::config::AppConfig;
use jobhub::notify::Notifier;
use jobhub::{Collaborators, Platform};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory platform with the sandbox payment gateway; notifications go to
/// whatever notifier the caller hands in.
pub(crate) fn wire_platform(
    config: &AppConfig,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
) -> Platform {
    Platform::in_memory(
        &config.auth,
        &config.marketplace,
        Collaborators {
            notifier,
            gateway: Arc::new(SandboxGateway::default()),
            clock,
        },
    )
}

/// Runs the expiry sweep on a fixed interval until the task is aborted.
pub(crate) fn spawn_expiry_sweep(platform: Platform, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let today = platform.clock.today();
            match platform.run_maintenance(today) {
                Ok(report) => debug!(
                    expired = report.expired_jobs.len(),
                    purged_codes = report.purged_codes,
                    "expiry sweep tick"
                ),
                Err(err) => error!(%err, "expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use jobhub::accounts::{AuthenticatedUser, Role};
    use jobhub::clock::ManualClock;
    use jobhub::entities::NewEntity;
    use jobhub::jobs::{EmploymentType, JobDraft, JobRequirements, JobStatus, Workplace};
    use jobhub::notify::RecordingNotifier;

    fn test_config() -> AppConfig {
        AppConfig {
            environment: jobhub::config::AppEnvironment::Test,
            server: jobhub::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: jobhub::config::TelemetryConfig {
                log_level: "info".to_string(),
            },
            auth: Default::default(),
            marketplace: Default::default(),
        }
    }

    #[tokio::test]
    async fn sweep_task_expires_due_jobs() {
        let clock = Arc::new(ManualClock::at_date(
            NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
        ));
        let platform = wire_platform(
            &test_config(),
            Arc::new(RecordingNotifier::default()),
            clock.clone(),
        );

        let view = platform
            .accounts
            .provision("owner@acme.test", "Owner", "sweep-pass-123", Role::Employer)
            .expect("provisions");
        let owner = AuthenticatedUser {
            user_id: view.id,
            role: view.role,
        };
        let entity = platform
            .entities
            .create(
                &owner,
                NewEntity {
                    name: "Acme".to_string(),
                    ..NewEntity::default()
                },
            )
            .expect("creates entity");
        platform
            .billing
            .purchase(&owner, &entity.id, "starter-5")
            .expect("buys credits");
        let job = platform
            .jobs
            .create_draft(
                &owner,
                &entity.id,
                JobDraft {
                    title: "Platform Engineer".to_string(),
                    description: String::new(),
                    location: "Remote".to_string(),
                    employment_type: EmploymentType::FullTime,
                    workplace: Workplace::Remote,
                    requirements: JobRequirements::default(),
                    salary: None,
                },
            )
            .expect("drafts");
        platform
            .jobs
            .publish(&owner, &job.id, clock.today())
            .expect("publishes");

        clock.advance_days(45);
        let sweep = spawn_expiry_sweep(platform.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweep.abort();

        let stored = platform
            .jobs
            .view(Some(&owner), &job.id, clock.today())
            .expect("visible to members");
        assert_eq!(stored.status, JobStatus::Expired);
    }
}
