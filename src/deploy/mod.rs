//! Deployment orchestration: create, trigger, poll until ready, resolve URL

pub mod clock;
mod endpoint;
mod orchestrator;

pub use clock::{Clock, ManualClock, TokioClock};
pub use endpoint::{ResolvedEndpoint, resolve_endpoint, with_scheme};
pub use orchestrator::{
    DeploymentOutcome, DeploymentState, Orchestrator, POLL_INTERVAL, SUCCESS_STATUSES, WaitPolicy,
    is_success_status,
};
