use std::time::Duration;
use tracing::{info, warn};

use super::clock::Clock;
use crate::descriptor::AppDescriptor;
use crate::platform::{AppDetail, PlatformApi, PlatformError};

/// Fixed interval between status polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status tokens (case-insensitive) meaning the app is serving traffic
pub const SUCCESS_STATUSES: &[&str] = &["active", "running"];

/// `Created -> Deploying -> {Active, TimedOut}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    Created,
    Deploying,
    Active,
    TimedOut,
}

/// Whether and how long to wait for the deployment to become healthy
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub wait: bool,
    /// Wall-clock budget measured from the deploy trigger
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(wait: bool, timeout: Duration) -> Self {
        Self {
            wait,
            timeout,
            interval: POLL_INTERVAL,
        }
    }

    pub fn no_wait() -> Self {
        Self::new(false, Duration::ZERO)
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub app_id: String,
    pub state: DeploymentState,
    pub polls: u32,
    pub last_status: Option<String>,
    /// Most recent detail response seen while polling
    pub detail: Option<AppDetail>,
}

pub fn is_success_status(status: &str) -> bool {
    let status = status.trim();
    SUCCESS_STATUSES
        .iter()
        .any(|s| status.eq_ignore_ascii_case(s))
}

/// Drives app creation, the deploy trigger and status polling
pub struct Orchestrator<'a> {
    api: &'a dyn PlatformApi,
    clock: &'a dyn Clock,
    policy: WaitPolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn PlatformApi, clock: &'a dyn Clock, policy: WaitPolicy) -> Self {
        Self { api, clock, policy }
    }

    /// Create, trigger and (optionally) wait
    pub async fn run(&self, descriptor: &AppDescriptor) -> Result<DeploymentOutcome, PlatformError> {
        let app_id = self.create(descriptor).await?;
        self.deploy(&app_id).await
    }

    /// Submit the creation payload; the app is `Created` on success
    pub async fn create(&self, descriptor: &AppDescriptor) -> Result<String, PlatformError> {
        let app_id = self.api.create_app(descriptor).await?;
        info!(app_id = %app_id, app = %descriptor.name, "Application created");
        Ok(app_id)
    }

    /// Trigger the deployment, then poll unless waiting is disabled
    pub async fn deploy(&self, app_id: &str) -> Result<DeploymentOutcome, PlatformError> {
        self.api.deploy_app(app_id).await?;
        let triggered_at = self.clock.now();
        info!(app_id, "Deployment triggered");

        if !self.policy.wait {
            return Ok(DeploymentOutcome {
                app_id: app_id.to_string(),
                state: DeploymentState::Deploying,
                polls: 0,
                last_status: None,
                detail: None,
            });
        }

        // A timeout past the clock's range means no deadline at all
        let deadline = triggered_at.checked_add(self.policy.timeout);
        if deadline.is_none() {
            warn!(
                app_id,
                timeout_secs = self.policy.timeout.as_secs(),
                "Timeout exceeds the clock range, polling without a deadline"
            );
        }
        let mut polls = 0u32;

        loop {
            polls += 1;
            let detail = self.api.get_app(app_id).await?;
            let status = detail.status();
            info!(
                app_id,
                attempt = polls,
                status = status.as_deref().unwrap_or("unknown"),
                "Deployment status"
            );

            if status.as_deref().is_some_and(is_success_status) {
                info!(app_id, polls, "Deployment is active");
                return Ok(DeploymentOutcome {
                    app_id: app_id.to_string(),
                    state: DeploymentState::Active,
                    polls,
                    last_status: status,
                    detail: Some(detail),
                });
            }

            let now = self.clock.now();
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(now),
                None => self.policy.interval,
            };
            if deadline.is_some() && remaining.is_zero() {
                warn!(
                    app_id,
                    polls,
                    timeout_secs = self.policy.timeout.as_secs(),
                    last_status = status.as_deref().unwrap_or("unknown"),
                    "Deployment did not become active before the timeout; it may still converge"
                );
                return Ok(DeploymentOutcome {
                    app_id: app_id.to_string(),
                    state: DeploymentState::TimedOut,
                    polls,
                    last_status: status,
                    detail: Some(detail),
                });
            }

            self.clock.sleep(self.policy.interval.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::clock::ManualClock;
    use crate::descriptor::{RegionSettings, Runtime};
    use crate::platform::{NewRegistry, RegistryRef};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a status sequence; the last status repeats once exhausted
    struct StatusSequence {
        statuses: Mutex<VecDeque<&'static str>>,
        last: &'static str,
        polls: Mutex<u32>,
        deploys: Mutex<u32>,
    }

    impl StatusSequence {
        fn new(statuses: &[&'static str]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                last: statuses.last().copied().unwrap_or("unknown"),
                polls: Mutex::new(0),
                deploys: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl PlatformApi for StatusSequence {
        async fn list_registries(&self) -> Result<Vec<RegistryRef>, PlatformError> {
            Ok(vec![])
        }

        async fn create_registry(&self, _request: &NewRegistry) -> Result<RegistryRef, PlatformError> {
            unreachable!()
        }

        async fn create_app(&self, _descriptor: &AppDescriptor) -> Result<String, PlatformError> {
            Ok("app-1".to_string())
        }

        async fn deploy_app(&self, _app_id: &str) -> Result<(), PlatformError> {
            *self.deploys.lock().unwrap() += 1;
            Ok(())
        }

        async fn get_app(&self, app_id: &str) -> Result<AppDetail, PlatformError> {
            *self.polls.lock().unwrap() += 1;
            let status = self.statuses.lock().unwrap().pop_front().unwrap_or(self.last);
            Ok(AppDetail::new(json!({ "id": app_id, "status": status })))
        }
    }

    fn descriptor() -> AppDescriptor {
        AppDescriptor {
            name: "shop".to_string(),
            runtime: Runtime::Shared,
            regions: RegionSettings::default(),
            containers: vec![],
        }
    }

    #[tokio::test]
    async fn test_reaches_active_after_three_polls() {
        let api = StatusSequence::new(&["Deploying", "Deploying", "Active"]);
        let clock = ManualClock::new();
        let orchestrator = Orchestrator::new(
            &api,
            &clock,
            WaitPolicy::new(true, Duration::from_secs(600)),
        );

        let outcome = orchestrator.run(&descriptor()).await.unwrap();

        assert_eq!(outcome.state, DeploymentState::Active);
        assert_eq!(outcome.polls, 3);
        assert_eq!(*api.polls.lock().unwrap(), 3);
        assert_eq!(outcome.last_status.as_deref(), Some("Active"));
        assert_eq!(clock.sleeps(), vec![POLL_INTERVAL, POLL_INTERVAL]);
    }

    #[tokio::test]
    async fn test_times_out_without_error() {
        let api = StatusSequence::new(&["Deploying"]);
        let clock = ManualClock::new();
        let orchestrator = Orchestrator::new(
            &api,
            &clock,
            WaitPolicy::new(true, Duration::from_secs(25)),
        );

        let outcome = orchestrator.run(&descriptor()).await.unwrap();

        assert_eq!(outcome.state, DeploymentState::TimedOut);
        // polls at 0s, 10s, 20s and 25s
        assert_eq!(outcome.polls, 4);
        assert_eq!(clock.elapsed(), Duration::from_secs(25));
        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(10),
                Duration::from_secs(10),
                Duration::from_secs(5)
            ]
        );
    }

    #[tokio::test]
    async fn test_huge_timeout_polls_without_deadline() {
        let api = StatusSequence::new(&["Deploying", "Deploying", "Active"]);
        let clock = ManualClock::new();
        let timeout = "18446744073709551615"
            .parse::<crate::humanize::HumanDuration>()
            .unwrap()
            .as_duration();
        let orchestrator = Orchestrator::new(&api, &clock, WaitPolicy::new(true, timeout));

        let outcome = orchestrator.deploy("app-1").await.unwrap();

        assert_eq!(outcome.state, DeploymentState::Active);
        assert_eq!(outcome.polls, 3);
        assert_eq!(clock.sleeps(), vec![POLL_INTERVAL, POLL_INTERVAL]);
    }

    #[tokio::test]
    async fn test_no_wait_returns_after_trigger() {
        let api = StatusSequence::new(&["Active"]);
        let clock = ManualClock::new();
        let orchestrator = Orchestrator::new(&api, &clock, WaitPolicy::no_wait());

        let outcome = orchestrator.run(&descriptor()).await.unwrap();

        assert_eq!(outcome.state, DeploymentState::Deploying);
        assert_eq!(outcome.polls, 0);
        assert_eq!(*api.deploys.lock().unwrap(), 1);
        assert_eq!(*api.polls.lock().unwrap(), 0);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_running_is_success() {
        let api = StatusSequence::new(&["RUNNING"]);
        let clock = ManualClock::new();
        let orchestrator = Orchestrator::new(
            &api,
            &clock,
            WaitPolicy::new(true, Duration::from_secs(60)),
        );

        let outcome = orchestrator.deploy("app-1").await.unwrap();
        assert_eq!(outcome.state, DeploymentState::Active);
        assert_eq!(outcome.polls, 1);
    }

    #[test]
    fn test_success_tokens() {
        assert!(is_success_status("active"));
        assert!(is_success_status(" Running "));
        assert!(!is_success_status("deploying"));
        assert!(!is_success_status("inactive"));
    }
}
