use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::fs;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use deckhand::build::{BuildError, ImageBuilder, RegistryLogin};
use deckhand::config::{HumanDuration, Settings};
use deckhand::deploy::{DeploymentState, ManualClock};
use deckhand::descriptor::AppDescriptor;
use deckhand::error::DeployError;
use deckhand::pipeline::{self, PLAN_PULL_REGISTRY_ID, PLAN_PUSH_REGISTRY_ID, Pipeline};
use deckhand::platform::{AppDetail, NewRegistry, PlatformApi, PlatformError, RegistryRef};
use deckhand::spec::{ContainerSpec, EndpointKind, SourceKind};

const SHOP_CONTAINERS: &str = r#"
- name: web
  build: true
  port: 8080
  env:
    RUST_LOG: info
    WORKERS: 4
- name: cache
  image: redis
"#;

/// In-memory platform that remembers registries and apps across runs
struct FakePlatform {
    registries: Mutex<Vec<RegistryRef>>,
    created_registries: Mutex<Vec<NewRegistry>>,
    apps: Mutex<Vec<AppDescriptor>>,
    deploys: Mutex<Vec<String>>,
    polls: Mutex<u32>,
    statuses: Mutex<VecDeque<&'static str>>,
    final_status: &'static str,
    hostname: Option<&'static str>,
    fail_create_app: bool,
}

impl FakePlatform {
    fn new(statuses: &[&'static str], hostname: Option<&'static str>) -> Self {
        Self {
            registries: Mutex::new(vec![]),
            created_registries: Mutex::new(vec![]),
            apps: Mutex::new(vec![]),
            deploys: Mutex::new(vec![]),
            polls: Mutex::new(0),
            statuses: Mutex::new(statuses.iter().copied().collect()),
            final_status: statuses.last().copied().unwrap_or("deploying"),
            hostname,
            fail_create_app: false,
        }
    }

    fn created_registry_count(&self) -> usize {
        self.created_registries.lock().unwrap().len()
    }

    fn polls(&self) -> u32 {
        *self.polls.lock().unwrap()
    }

    fn last_app(&self) -> AppDescriptor {
        self.apps.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn list_registries(&self) -> Result<Vec<RegistryRef>, PlatformError> {
        Ok(self.registries.lock().unwrap().clone())
    }

    async fn create_registry(&self, request: &NewRegistry) -> Result<RegistryRef, PlatformError> {
        self.created_registries.lock().unwrap().push(request.clone());
        let mut registries = self.registries.lock().unwrap();
        let created = RegistryRef {
            id: format!("reg-{}", registries.len() + 1),
            name: request.name.clone(),
            host: request.host.clone(),
            public: request.public,
        };
        registries.push(created.clone());
        Ok(created)
    }

    async fn create_app(&self, descriptor: &AppDescriptor) -> Result<String, PlatformError> {
        if self.fail_create_app {
            return Err(PlatformError::Status {
                method: "POST".to_string(),
                path: "/apps".to_string(),
                status: 422,
                body: r#"{"error":"invalid region"}"#.to_string(),
            });
        }
        let mut apps = self.apps.lock().unwrap();
        apps.push(descriptor.clone());
        Ok(format!("app-{}", apps.len()))
    }

    async fn deploy_app(&self, app_id: &str) -> Result<(), PlatformError> {
        self.deploys.lock().unwrap().push(app_id.to_string());
        Ok(())
    }

    async fn get_app(&self, app_id: &str) -> Result<AppDetail, PlatformError> {
        *self.polls.lock().unwrap() += 1;
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.final_status);

        let endpoints = match self.hostname {
            Some(hostname) => json!([{ "name": "web", "hostname": hostname }]),
            None => json!([]),
        };
        Ok(AppDetail::new(json!({
            "app": {
                "id": app_id,
                "deploymentStatus": status,
                "containers": [{ "name": "web", "endpoints": endpoints }]
            }
        })))
    }
}

/// Records build tool invocations instead of running them
#[derive(Default)]
struct RecordingBuilder {
    steps: Mutex<Vec<String>>,
    fail_build: bool,
}

impl RecordingBuilder {
    fn steps(&self) -> Vec<String> {
        self.steps.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageBuilder for RecordingBuilder {
    async fn login(&self, login: &RegistryLogin) -> Result<(), BuildError> {
        self.steps
            .lock()
            .unwrap()
            .push(format!("login {} {}", login.host, login.username));
        Ok(())
    }

    async fn build(&self, container: &ContainerSpec) -> Result<(), BuildError> {
        if self.fail_build {
            return Err(BuildError::Failed {
                step: "build",
                target: container.tagged_image(),
                code: Some(1),
            });
        }
        self.steps
            .lock()
            .unwrap()
            .push(format!("build {}", container.tagged_image()));
        Ok(())
    }

    async fn push(&self, container: &ContainerSpec) -> Result<(), BuildError> {
        self.steps
            .lock()
            .unwrap()
            .push(format!("push {}", container.tagged_image()));
        Ok(())
    }
}

fn shop_settings() -> Settings {
    let mut settings = Settings::default();
    settings.app.name = Some("shop".to_string());
    settings.app.descriptor = None;
    settings.app.containers = Some(SHOP_CONTAINERS.to_string());
    settings.build.sha = Some("abc123".to_string());
    settings.push_registry.host = "ghcr.io/org".to_string();
    settings.push_registry.username = Some("bot".to_string());
    settings.push_registry.password = Some("pw".to_string());
    settings.private_registry.provision = true;
    settings.private_registry.name = Some("org-ghcr".to_string());
    settings.private_registry.kind = "ghcr".to_string();
    settings.private_registry.token = Some("pat".to_string());
    settings.endpoint.create = true;
    settings
}

#[tokio::test]
async fn test_shop_end_to_end() {
    let settings = shop_settings();
    let api = FakePlatform::new(&["Deploying", "Deploying", "Active"], Some("shop.example.app"));
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();

    let ctx = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap();

    // Resolved spec
    let web = ctx.spec.container("web").unwrap();
    assert_eq!(web.image, "ghcr.io/org/shop");
    assert_eq!(web.tag, "abc123");
    let cache = ctx.spec.container("cache").unwrap();
    assert_eq!(cache.tag, "latest");
    assert_eq!(cache.image_ref().namespace, "library");

    // Build tool: one login, then build and push the built container only
    assert_eq!(
        builder.steps(),
        vec![
            "login ghcr.io bot",
            "build ghcr.io/org/shop:abc123",
            "push ghcr.io/org/shop:abc123",
        ]
    );

    // Registries: public pull + private push, both created on first run
    assert_eq!(api.created_registry_count(), 2);
    let registries = ctx.registries.clone();
    assert!(registries.pull.is_some());
    assert!(registries.push.is_some());

    // Descriptor sent to the platform
    let app = api.last_app();
    assert_eq!(app.name, "shop");
    let web_template = &app.containers[0];
    assert_eq!(web_template.image.namespace, "org");
    assert_eq!(web_template.image.name, "shop");
    assert_eq!(web_template.image.tag, "abc123");
    assert_eq!(Some(&web_template.image.registry_id), registries.push.as_ref());
    assert_eq!(web_template.env.len(), 2);
    assert_eq!(web_template.env[1].value, "4");
    assert_eq!(web_template.endpoints.len(), 1);
    assert_eq!(web_template.endpoints[0].kind, EndpointKind::Cdn);

    let cache_template = &app.containers[1];
    assert_eq!(cache_template.image.namespace, "library");
    assert_eq!(cache_template.image.name, "redis");
    assert_eq!(Some(&cache_template.image.registry_id), registries.pull.as_ref());
    assert!(cache_template.endpoints.is_empty());

    // Polling: three polls, two sleeps of the fixed interval
    let outcome = ctx.outcome.as_ref().unwrap();
    assert_eq!(outcome.state, DeploymentState::Active);
    assert_eq!(outcome.polls, 3);
    assert_eq!(api.polls(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 2]);

    assert_eq!(ctx.outputs.app_id, "app-1");
    assert_eq!(ctx.outputs.url, "https://shop.example.app");
    assert_eq!(ctx.outputs.hostname, "shop.example.app");
}

#[tokio::test]
async fn test_rerun_reuses_registries() {
    let settings = shop_settings();
    let api = FakePlatform::new(&["active"], Some("shop.example.app"));
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();
    let pipeline = Pipeline::new(&settings, &api, &builder, &clock);

    let first = pipeline.run().await.unwrap();
    let second = pipeline.run().await.unwrap();

    assert_eq!(api.created_registry_count(), 2);
    assert_eq!(first.registries, second.registries);
}

#[tokio::test]
async fn test_timeout_is_a_warning_not_an_error() {
    let mut settings = shop_settings();
    settings.deploy.timeout = HumanDuration(25);
    let api = FakePlatform::new(&["Deploying"], None);
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();

    let ctx = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap();

    assert_eq!(ctx.state(), Some(DeploymentState::TimedOut));
    assert_eq!(api.polls(), 4);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(5)
        ]
    );
    assert_eq!(ctx.outputs.app_id, "app-1");
    assert_eq!(ctx.outputs.url, "");
    assert_eq!(ctx.outputs.hostname, "");
}

#[tokio::test]
async fn test_no_wait_reads_detail_once() {
    let mut settings = shop_settings();
    settings.deploy.wait = false;
    let api = FakePlatform::new(&["deploying"], Some("shop.example.app"));
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();

    let ctx = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap();

    assert_eq!(ctx.state(), Some(DeploymentState::Deploying));
    assert_eq!(ctx.outcome.as_ref().unwrap().polls, 0);
    assert_eq!(api.polls(), 1);
    assert!(clock.sleeps().is_empty());
    assert_eq!(ctx.outputs.hostname, "shop.example.app");
}

#[tokio::test]
async fn test_descriptor_file_wins_over_inline_list() {
    let temp_dir = TempDir::new().unwrap();
    let descriptor_path = temp_dir.path().join("deckhand.yaml");
    fs::write(
        &descriptor_path,
        r#"
name: storefront
containers:
  - name: api
    build: true
    port: 3000
    endpoints:
      - name: public
        type: anycast
        portMappings:
          - containerPort: 3000
            exposedPort: 443
"#,
    )
    .unwrap();

    let mut settings = shop_settings();
    settings.app.name = None;
    settings.app.descriptor = Some(descriptor_path);
    settings.endpoint.create = false;

    let api = FakePlatform::new(&["running"], None);
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();

    let ctx = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap();

    assert_eq!(ctx.spec.source, SourceKind::File);
    assert_eq!(ctx.spec.name, "storefront");
    assert!(ctx.spec.create_endpoints);
    assert!(ctx.spec.container("web").is_none());

    let api_container = ctx.spec.container("api").unwrap();
    assert_eq!(api_container.image, "ghcr.io/org/storefront");

    // Only built images, so no public registry is needed
    assert_eq!(api.created_registry_count(), 1);
    assert!(ctx.registries.pull.is_none());

    let app = api.last_app();
    let endpoint = &app.containers[0].endpoints[0];
    assert_eq!(endpoint.name, "public");
    assert_eq!(endpoint.kind, EndpointKind::Anycast);
    assert_eq!(endpoint.port_mappings[0].exposed_port, Some(443));
}

#[tokio::test]
async fn test_build_failure_stops_before_platform_calls() {
    let settings = shop_settings();
    let api = FakePlatform::new(&["active"], None);
    let builder = RecordingBuilder {
        fail_build: true,
        ..Default::default()
    };
    let clock = ManualClock::new();

    let err = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Build(BuildError::Failed { step: "build", .. })));
    assert_eq!(api.created_registry_count(), 0);
    assert!(api.apps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_platform_error_is_fatal() {
    let settings = shop_settings();
    let mut api = FakePlatform::new(&["active"], None);
    api.fail_create_app = true;
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();

    let err = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap_err();

    match err {
        DeployError::Platform(PlatformError::Status { status, body, .. }) => {
            assert_eq!(status, 422);
            assert!(body.contains("invalid region"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(api.deploys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_sources_is_config_error() {
    let mut settings = shop_settings();
    settings.app.containers = None;
    let api = FakePlatform::new(&["active"], None);
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();

    let err = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Spec(_)));
    assert!(builder.steps().is_empty());
    assert_eq!(api.polls(), 0);
}

#[test]
fn test_plan_uses_placeholder_registry_ids() {
    let settings = shop_settings();

    let descriptor = pipeline::plan(&settings).unwrap();

    assert_eq!(descriptor.containers[0].image.registry_id, PLAN_PUSH_REGISTRY_ID);
    assert_eq!(descriptor.containers[1].image.registry_id, PLAN_PULL_REGISTRY_ID);

    let json = serde_json::to_value(&descriptor).unwrap();
    assert_eq!(json["containers"][0]["image"]["tag"], "abc123");
    assert_eq!(json["containers"][1]["image"]["namespace"], "library");
}

#[tokio::test]
async fn test_plan_matches_deploy_without_private_registry() {
    let mut settings = shop_settings();
    settings.private_registry.provision = false;
    settings.private_registry.name = None;

    let planned = pipeline::plan(&settings).unwrap();
    assert_eq!(planned.containers[0].image.registry_id, PLAN_PULL_REGISTRY_ID);

    let api = FakePlatform::new(&["active"], None);
    let builder = RecordingBuilder::default();
    let clock = ManualClock::new();
    let ctx = Pipeline::new(&settings, &api, &builder, &clock)
        .run()
        .await
        .unwrap();

    assert!(ctx.registries.push.is_none());
    assert_eq!(api.created_registry_count(), 1);
    assert_eq!(
        Some(&api.last_app().containers[0].image.registry_id),
        ctx.registries.pull.as_ref()
    );
}
