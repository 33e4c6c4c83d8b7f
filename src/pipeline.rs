//! End-to-end run: resolve, build, provision, describe, deploy, resolve URL.
//!
//! Every stage is sequential and fail-fast. State produced by one stage is
//! carried to the next in a [`RunContext`] rather than shared globally.

use tracing::{info, warn};

use crate::build::ImageBuilder;
use crate::config::Settings;
use crate::deploy::{Clock, DeploymentOutcome, DeploymentState, Orchestrator, resolve_endpoint};
use crate::descriptor::{AppDescriptor, build_descriptor};
use crate::error::Result;
use crate::outputs::RunOutputs;
use crate::platform::PlatformApi;
use crate::provision::{
    RegistryIds, needs_pull_registry, needs_push_registry, provision_registries,
};
use crate::spec::{self, AppSpec};

/// Stand-in registry ids for `plan`, which never talks to the platform
pub const PLAN_PULL_REGISTRY_ID: &str = "<public-pull-registry>";
pub const PLAN_PUSH_REGISTRY_ID: &str = "<private-push-registry>";

/// Values accumulated over one run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub spec: AppSpec,
    pub registries: RegistryIds,
    pub outcome: Option<DeploymentOutcome>,
    pub outputs: RunOutputs,
}

impl RunContext {
    fn new(spec: AppSpec) -> Self {
        Self {
            spec,
            registries: RegistryIds::default(),
            outcome: None,
            outputs: RunOutputs::default(),
        }
    }

    pub fn state(&self) -> Option<DeploymentState> {
        self.outcome.as_ref().map(|o| o.state)
    }
}

/// Select the single config source and resolve it into an [`AppSpec`]
pub fn resolve_spec(settings: &Settings) -> Result<AppSpec> {
    let source = spec::select_source(
        settings.app.containers.as_deref(),
        settings.app.descriptor.as_deref(),
    )?;
    let app = spec::resolve(&source, &settings.resolve_defaults())?;
    info!(
        app = %app.name,
        containers = app.containers.len(),
        source = ?app.source,
        "Resolved app spec"
    );
    Ok(app)
}

/// Descriptor that `deploy` would submit, with placeholder registry ids
pub fn plan(settings: &Settings) -> Result<AppDescriptor> {
    let app = resolve_spec(settings)?;
    let credentials = settings.registry_credentials();
    let registries = RegistryIds {
        pull: needs_pull_registry(&app.containers).then(|| PLAN_PULL_REGISTRY_ID.to_string()),
        push: (needs_push_registry(&app.containers, &credentials)
            && credentials.display_name().is_some())
        .then(|| PLAN_PUSH_REGISTRY_ID.to_string()),
    };
    Ok(build_descriptor(&app, &registries, &settings.endpoint_defaults()))
}

pub struct Pipeline<'a> {
    settings: &'a Settings,
    api: &'a dyn PlatformApi,
    builder: &'a dyn ImageBuilder,
    clock: &'a dyn Clock,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        api: &'a dyn PlatformApi,
        builder: &'a dyn ImageBuilder,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            settings,
            api,
            builder,
            clock,
        }
    }

    pub async fn run(&self) -> Result<RunContext> {
        let mut ctx = RunContext::new(resolve_spec(self.settings)?);

        self.build_images(&ctx).await?;

        ctx.registries = provision_registries(
            self.api,
            &ctx.spec.containers,
            &self.settings.registry_credentials(),
        )
        .await?;

        let descriptor =
            build_descriptor(&ctx.spec, &ctx.registries, &self.settings.endpoint_defaults());

        let orchestrator = Orchestrator::new(self.api, self.clock, self.settings.wait_policy());
        let outcome = orchestrator.run(&descriptor).await?;

        // Polling already fetched the detail unless waiting was disabled
        let detail = match &outcome.detail {
            Some(detail) => detail.clone(),
            None => self.api.get_app(&outcome.app_id).await?,
        };

        let endpoint = resolve_endpoint(&detail);
        match &endpoint {
            Some(endpoint) => info!(app_id = %outcome.app_id, url = %endpoint.url, "Resolved endpoint"),
            None => warn!(app_id = %outcome.app_id, "Endpoint not yet provisioned"),
        }

        ctx.outputs = RunOutputs {
            app_id: outcome.app_id.clone(),
            url: endpoint.as_ref().map(|e| e.url.clone()).unwrap_or_default(),
            hostname: endpoint.map(|e| e.hostname).unwrap_or_default(),
        };
        ctx.outcome = Some(outcome);

        Ok(ctx)
    }

    /// Login once, then build and push each build-sourced container in order
    async fn build_images(&self, ctx: &RunContext) -> Result<()> {
        if !ctx.spec.builds_any() {
            return Ok(());
        }

        match self.settings.registry_login() {
            Some(login) => self.builder.login(&login).await?,
            None => info!("No push registry credentials, skipping login"),
        }

        for container in ctx.spec.containers.iter().filter(|c| c.build) {
            self.builder.build(container).await?;
            self.builder.push(container).await?;
        }

        Ok(())
    }
}
