use clap::{Parser, Subcommand};
use deckhand::config::Overrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deckhand")]
#[command(about = "Deploy a multi-container app to the hosting platform from CI", long_about = None)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "DECKHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter when RUST_LOG is not set (e.g. `debug`, `deckhand=trace`)
    #[arg(long, global = true, env = "DECKHAND_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, provision, create and deploy the app, then report its URL
    Deploy(DeployArgs),
    /// Print the app descriptor that `deploy` would submit, without network calls
    Plan(SpecArgs),
}

/// Inputs that shape the resolved app spec; CI action inputs bind via `INPUT_*`
#[derive(clap::Args, Debug)]
pub struct SpecArgs {
    /// Application name (wins over the descriptor's name)
    #[arg(long, env = "INPUT_APP_NAME")]
    pub app_name: Option<String>,

    /// `default`, `single`, or a reserved capacity token
    #[arg(long, env = "INPUT_DEPLOYMENT_TYPE")]
    pub deployment_type: Option<String>,

    #[arg(long, env = "INPUT_REGION")]
    pub region: Option<String>,

    /// Inline container list (YAML or JSON)
    #[arg(long, env = "INPUT_CONTAINERS")]
    pub containers: Option<String>,

    /// Descriptor file; used instead of --containers when it exists
    #[arg(long, env = "INPUT_DESCRIPTOR")]
    pub descriptor: Option<PathBuf>,

    /// Image prefix for built images, e.g. `ghcr.io/acme`
    #[arg(long, env = "INPUT_REGISTRY")]
    pub registry: Option<String>,

    /// Build identifier used as the default tag of built images
    #[arg(long, env = "INPUT_SHA")]
    pub sha: Option<String>,

    /// Create an endpoint for the exposed container (inline list only)
    #[arg(long, env = "INPUT_CREATE_ENDPOINTS")]
    pub create_endpoints: Option<bool>,

    #[arg(long, env = "INPUT_ENDPOINT_NAME")]
    pub endpoint_name: Option<String>,

    /// `cdn` or `anycast`
    #[arg(long, env = "INPUT_ENDPOINT_TYPE")]
    pub endpoint_type: Option<String>,

    /// Container to expose instead of the first one declaring a port
    #[arg(long, env = "INPUT_ENDPOINT_CONTAINER")]
    pub endpoint_container: Option<String>,

    #[arg(long, env = "INPUT_EXPOSED_PORT")]
    pub exposed_port: Option<u16>,
}

#[derive(clap::Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Platform API base URL
    #[arg(long, env = "INPUT_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, env = "INPUT_REGISTRY_USERNAME")]
    pub registry_username: Option<String>,

    /// Private registry display name on the platform
    #[arg(long, env = "INPUT_PRIVATE_REGISTRY_NAME")]
    pub private_registry_name: Option<String>,

    /// Create the private registry when it does not exist yet
    #[arg(long, env = "INPUT_PROVISION_REGISTRY")]
    pub provision_registry: Option<bool>,

    /// Platform registry type for a provisioned private registry
    #[arg(long, env = "INPUT_REGISTRY_TYPE")]
    pub registry_type: Option<String>,

    /// Wait for the deployment to become active
    #[arg(long, env = "INPUT_WAIT")]
    pub wait: Option<bool>,

    /// Return right after the deploy trigger (wins over --wait)
    #[arg(long)]
    pub no_wait: bool,

    /// Wait budget, e.g. `600`, `10m`, `1h30m`
    #[arg(long, env = "INPUT_TIMEOUT")]
    pub timeout: Option<String>,
}

impl SpecArgs {
    pub fn apply(&self, overrides: &mut Overrides) {
        overrides
            .set("app.name", self.app_name.clone())
            .set("app.deployment_type", self.deployment_type.clone())
            .set("app.region", self.region.clone())
            .set("app.containers", self.containers.clone())
            .set(
                "app.descriptor",
                self.descriptor.as_ref().map(|p| p.display().to_string()),
            )
            .set("push_registry.host", self.registry.clone())
            .set("build.sha", self.sha.clone())
            .set("endpoint.create", self.create_endpoints)
            .set("endpoint.name", self.endpoint_name.clone())
            .set("endpoint.kind", self.endpoint_type.clone())
            .set("endpoint.container", self.endpoint_container.clone())
            .set("endpoint.exposed_port", self.exposed_port.map(i64::from));
    }
}

impl DeployArgs {
    pub fn apply(&self, overrides: &mut Overrides) {
        self.spec.apply(overrides);

        let wait = if self.no_wait { Some(false) } else { self.wait };
        overrides
            .set("platform.api_url", self.api_url.clone())
            .set("push_registry.username", self.registry_username.clone())
            .set("private_registry.name", self.private_registry_name.clone())
            .set("private_registry.provision", self.provision_registry)
            .set("private_registry.kind", self.registry_type.clone())
            .set("deploy.wait", wait)
            .set("deploy.timeout", self.timeout.clone());
    }
}

impl Cli {
    /// Command-line values to layer over file and environment settings
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides::new();
        match &self.command {
            Commands::Deploy(args) => args.apply(&mut overrides),
            Commands::Plan(args) => args.apply(&mut overrides),
        }
        overrides
    }
}
