//! External container build tool (docker-compatible CLI)

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

use crate::spec::ContainerSpec;

pub const DEFAULT_TOOL: &str = "docker";
pub const DEFAULT_TARGET_PLATFORM: &str = "linux/amd64";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to start '{tool}': {message}")]
    Spawn { tool: String, message: String },

    #[error("{step} failed for {target} (exit code {code:?})")]
    Failed {
        step: &'static str,
        target: String,
        code: Option<i32>,
    },
}

/// Push registry login
#[derive(Debug, Clone)]
pub struct RegistryLogin {
    pub host: String,
    pub username: String,
    pub password: String,
}

#[async_trait]
pub trait ImageBuilder: Send + Sync {
    async fn login(&self, login: &RegistryLogin) -> Result<(), BuildError>;

    async fn build(&self, container: &ContainerSpec) -> Result<(), BuildError>;

    async fn push(&self, container: &ContainerSpec) -> Result<(), BuildError>;
}

/// Runs `docker login`, `docker buildx build` and `docker push`
#[derive(Debug, Clone)]
pub struct DockerCli {
    tool: String,
    target_platform: String,
}

impl DockerCli {
    pub fn new(tool: impl Into<String>, target_platform: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            target_platform: target_platform.into(),
        }
    }

    pub fn build_args(&self, container: &ContainerSpec) -> Vec<String> {
        vec![
            "buildx".to_string(),
            "build".to_string(),
            "--platform".to_string(),
            self.target_platform.clone(),
            "-t".to_string(),
            container.tagged_image(),
            "-f".to_string(),
            dockerfile_path(container),
            "--load".to_string(),
            container.context.clone(),
        ]
    }

    async fn run(
        &self,
        step: &'static str,
        target: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<(), BuildError> {
        let mut command = Command::new(&self.tool);
        command
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let spawn_error = |e: std::io::Error| BuildError::Spawn {
            tool: self.tool.clone(),
            message: e.to_string(),
        };

        let mut child = command.spawn().map_err(spawn_error)?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await.map_err(spawn_error)?;
            drop(pipe);
        }

        let status = child.wait().await.map_err(spawn_error)?;
        if !status.success() {
            return Err(BuildError::Failed {
                step,
                target: target.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL, DEFAULT_TARGET_PLATFORM)
    }
}

#[async_trait]
impl ImageBuilder for DockerCli {
    async fn login(&self, login: &RegistryLogin) -> Result<(), BuildError> {
        info!(host = %login.host, username = %login.username, "Logging in to push registry");
        let args = vec![
            "login".to_string(),
            login.host.clone(),
            "-u".to_string(),
            login.username.clone(),
            "--password-stdin".to_string(),
        ];
        self.run("login", &login.host, &args, Some(&login.password))
            .await
    }

    async fn build(&self, container: &ContainerSpec) -> Result<(), BuildError> {
        let image = container.tagged_image();
        info!(container = %container.name, image = %image, platform = %self.target_platform, "Building image");
        self.run("build", &image, &self.build_args(container), None)
            .await
    }

    async fn push(&self, container: &ContainerSpec) -> Result<(), BuildError> {
        let image = container.tagged_image();
        info!(container = %container.name, image = %image, "Pushing image");
        let args = vec!["push".to_string(), image.clone()];
        self.run("push", &image, &args, None).await
    }
}

/// Dockerfile path relative to the build context unless already qualified
fn dockerfile_path(container: &ContainerSpec) -> String {
    let dockerfile = std::path::Path::new(&container.dockerfile);
    if dockerfile.is_absolute() || container.context == "." || container.dockerfile.contains('/') {
        container.dockerfile.clone()
    } else {
        format!("{}/{}", container.context.trim_end_matches('/'), container.dockerfile)
    }
}
