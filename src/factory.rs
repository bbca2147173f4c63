//! Built-in authorizer constructors.

use crate::authorizer::{
    AuthFile, Authorizer, ClientSecretAuthorizer, ClientSecretCredentials, CliAuthorizer,
    CliRunner, ProcessCliRunner,
};
use crate::config::{CloudEnvironment, EnvVarNames};
use crate::env::Env;
use crate::error::{AuthError, Result};
use crate::selector::AuthorizerFactory;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// [`AuthorizerFactory`] producing the crate's own authorizers.
///
/// - environment: client secret credentials read from the configured variables
/// - file: SDK auth file at the path in the auth location variable
/// - cli: token from `az account get-access-token`
pub struct SdkAuthorizerFactory {
    env: Env,
    names: EnvVarNames,
    http: Option<reqwest::blocking::Client>,
    cli_runner: Arc<dyn CliRunner>,
}

impl SdkAuthorizerFactory {
    pub fn new(env: Env, names: EnvVarNames) -> Self {
        Self {
            env,
            names,
            http: None,
            cli_runner: Arc::new(ProcessCliRunner),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cli_runner(mut self, runner: Arc<dyn CliRunner>) -> Self {
        self.cli_runner = runner;
        self
    }

    // Built lazily; the CLI path never needs one.
    fn http(&self) -> Result<reqwest::blocking::Client> {
        match &self.http {
            Some(http) => Ok(http.clone()),
            None => reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .map_err(|e| AuthError::HttpError(format!("Failed to build HTTP client: {e}"))),
        }
    }

    fn cloud(&self) -> Result<CloudEnvironment> {
        match self.env.non_empty(&self.names.environment) {
            Some(name) => CloudEnvironment::from_name(&name),
            None => Ok(CloudEnvironment::default()),
        }
    }
}

impl AuthorizerFactory for SdkAuthorizerFactory {
    type Authorizer = Box<dyn Authorizer>;

    fn authorizer_from_environment(&self) -> Result<Self::Authorizer> {
        let creds = ClientSecretCredentials::from_env(&self.env, &self.names)?;
        info!(
            client_id = %creds.client_id,
            tenant_id = %creds.tenant_id,
            "using service principal from environment"
        );
        Ok(Box::new(ClientSecretAuthorizer::new(creds, self.http()?)))
    }

    fn authorizer_from_file(&self, resource_manager_endpoint: &str) -> Result<Self::Authorizer> {
        let path = self.env.non_empty(&self.names.auth_location).ok_or_else(|| {
            AuthError::ConfigurationError(format!(
                "{} is not set or empty",
                self.names.auth_location
            ))
        })?;
        let file = AuthFile::load(&path)?;
        let resource = file.resource_for(resource_manager_endpoint)?;
        debug!(path = %path, resource = %resource, "loaded auth file");
        info!(client_id = %file.client_id, "using service principal from auth file");
        Ok(Box::new(ClientSecretAuthorizer::new(
            file.credentials(resource),
            self.http()?,
        )))
    }

    fn authorizer_from_cli(&self) -> Result<Self::Authorizer> {
        let cloud = self.cloud()?;
        info!(cloud = cloud.name, "using Azure CLI session");
        let auth = CliAuthorizer::new(cloud.resource_manager_endpoint, self.cli_runner.clone())?;
        Ok(Box::new(auth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::CliOutput;

    struct CannedRunner(CliOutput);

    impl CliRunner for CannedRunner {
        fn run(&self, _program: &str, args: &[&str]) -> std::io::Result<CliOutput> {
            assert_eq!(args[3], "https://management.chinacloudapi.cn/");
            Ok(self.0.clone())
        }
    }

    #[test]
    fn file_location_must_be_non_empty() {
        let env = Env::from_slice(&[("ARM_AUTH_LOCATION", "")]);
        let factory = SdkAuthorizerFactory::new(env, EnvVarNames::arm());
        let err = factory
            .authorizer_from_file("https://management.azure.com/")
            .err()
            .unwrap();
        assert_eq!(
            err,
            AuthError::ConfigurationError("ARM_AUTH_LOCATION is not set or empty".into())
        );
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let env = Env::from_slice(&[("ARM_AUTH_LOCATION", "/definitely/not/here.json")]);
        let factory = SdkAuthorizerFactory::new(env, EnvVarNames::arm());
        let err = factory
            .authorizer_from_file("https://management.azure.com/")
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::ConfigurationError(msg) if msg.contains("here.json")));
    }

    #[test]
    fn cli_uses_named_cloud() {
        let env = Env::from_slice(&[("AZURE_ENVIRONMENT", "AzureChinaCloud")]);
        let runner = Arc::new(CannedRunner(CliOutput {
            success: true,
            stdout: r#"{"accessToken":"cn","expires_on":4102444800}"#.to_string(),
            stderr: String::new(),
        }));
        let factory =
            SdkAuthorizerFactory::new(env, EnvVarNames::azure()).with_cli_runner(runner);
        let auth = factory.authorizer_from_cli().ok().unwrap();
        assert_eq!(auth.token().unwrap(), "cn");
    }

    #[test]
    fn unknown_cloud_fails_cli_construction() {
        let env = Env::from_slice(&[("ARM_ENVIRONMENT", "Atlantis")]);
        let factory = SdkAuthorizerFactory::new(env, EnvVarNames::arm());
        let err = factory.authorizer_from_cli().err().unwrap();
        assert!(matches!(err, AuthError::ConfigurationError(_)));
    }
}
