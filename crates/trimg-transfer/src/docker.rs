//! Registry client backed by the `docker` and `aws` command line tools

use trimg_manifest::{ImageReference, RegistryHost};

use crate::command;
use crate::error::{CommandError, RegistryError};
use crate::registry::{RegistryClient, RegistryCredentials};

const DOCKER: &str = "docker";
const AWS: &str = "aws";
const ALREADY_EXISTS_CODE: &str = "RepositoryAlreadyExistsException";

/// Pulls with the local Docker daemon and pushes into ECR
#[derive(Debug, Clone)]
pub struct DockerCliRegistry {
    region: String,
    host: RegistryHost,
    docker: String,
    aws: String,
}

impl DockerCliRegistry {
    /// Client for the ECR registry `host` in `region`
    #[inline]
    #[must_use]
    pub fn new(region: impl Into<String>, host: RegistryHost) -> Self {
        Self {
            region: region.into(),
            host,
            docker: DOCKER.to_string(),
            aws: AWS.to_string(),
        }
    }

    /// Run these executables instead of `docker` and `aws` from `PATH`
    #[inline]
    #[must_use]
    pub fn with_programs(mut self, docker: impl Into<String>, aws: impl Into<String>) -> Self {
        self.docker = docker.into();
        self.aws = aws.into();
        self
    }

    async fn docker(&self, args: &[&str], stdin: Option<&str>) -> Result<String, CommandError> {
        command::run(&self.docker, args, stdin).await
    }

    async fn aws(&self, args: &[&str]) -> Result<String, CommandError> {
        command::run(&self.aws, args, None).await
    }
}

#[async_trait::async_trait]
impl RegistryClient for DockerCliRegistry {
    async fn pull(&self, reference: &str, image: &ImageReference) -> Result<(), RegistryError> {
        let first = match self.docker(&["pull", reference], None).await {
            Ok(_) => return Ok(()),
            Err(err) if image.names_registry() => return Err(err.into()),
            Err(err) => err,
        };

        // Short names may need the fully qualified Docker Hub form.
        let canonical = image.docker_hub_name();
        tracing::debug!(reference, %canonical, error = %first, "retrying pull with canonical name");
        if let Err(fallback) = self.docker(&["pull", canonical.as_str()], None).await {
            return Err(RegistryError::PullFailed {
                reference: reference.to_string(),
                canonical,
                first,
                fallback,
            });
        }
        self.docker(&["tag", canonical.as_str(), reference], None).await?;
        Ok(())
    }

    async fn ensure_repository(&self, repository: &str) -> Result<(), RegistryError> {
        let args = [
            "ecr",
            "create-repository",
            "--repository-name",
            repository,
            "--region",
            self.region.as_str(),
        ];
        match self.aws(&args).await {
            Ok(_) => Ok(()),
            Err(err) if err.stderr().is_some_and(|s| s.contains(ALREADY_EXISTS_CODE)) => {
                Err(RegistryError::RepositoryAlreadyExists(repository.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn authenticate(&self) -> Result<RegistryCredentials, RegistryError> {
        let args = [
            "ecr",
            "get-authorization-token",
            "--region",
            self.region.as_str(),
            "--query",
            "authorizationData[0].[authorizationToken,proxyEndpoint]",
            "--output",
            "text",
        ];
        let output = self.aws(&args).await?;
        let mut fields = output.split_whitespace();
        let (Some(token), Some(endpoint)) = (fields.next(), fields.next()) else {
            return Err(RegistryError::InvalidAuthorizationToken(
                "missing authorization data".to_string(),
            ));
        };

        let credentials = RegistryCredentials::from_authorization_token(token, endpoint)?;
        self.docker(
            &[
                "login",
                "--username",
                credentials.username.as_str(),
                "--password-stdin",
                credentials.endpoint.as_str(),
            ],
            Some(credentials.password.as_str()),
        )
        .await?;
        Ok(credentials)
    }

    async fn tag(&self, source: &str, destination: &str) -> Result<(), RegistryError> {
        self.docker(&["tag", source, destination], None).await?;
        Ok(())
    }

    async fn push(
        &self,
        destination: &str,
        credentials: &RegistryCredentials,
    ) -> Result<(), RegistryError> {
        if !credentials.endpoint.contains(self.host.as_str()) {
            tracing::warn!(
                endpoint = %credentials.endpoint,
                host = %self.host,
                "credentials endpoint does not match destination registry"
            );
        }
        self.docker(&["push", destination], None).await?;
        Ok(())
    }
}
