//! Picks an authentication method from the environment and builds the authorizer.
//!
//! Resolution order (first match wins):
//! 1) client id, client secret, subscription id and tenant id all set: environment
//! 2) auth file location set: file, against the public Resource Manager endpoint
//! 3) otherwise: Azure CLI
//!
//! Only presence is checked here; an empty value still counts as set. Whatever the
//! chosen constructor returns, success or error, is handed back unchanged.

use crate::authorizer::{Authorizer, CliRunner};
use crate::config::{DEFAULT_RESOURCE_MANAGER_ENDPOINT, EnvVarNames};
use crate::env::Env;
use crate::error::Result;
use crate::factory::SdkAuthorizerFactory;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The three ways an authorizer can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMethod {
    /// Service principal from environment variables.
    Environment,
    /// Service principal from an SDK auth file.
    File,
    /// Logged-in Azure CLI session.
    Cli,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Environment => "environment",
            AuthMethod::File => "file",
            AuthMethod::Cli => "cli",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides which method applies without constructing anything.
pub fn select_method(env: &Env, names: &EnvVarNames) -> AuthMethod {
    if names.service_principal().iter().all(|name| env.is_set(name)) {
        AuthMethod::Environment
    } else if env.is_set(&names.auth_location) {
        AuthMethod::File
    } else {
        AuthMethod::Cli
    }
}

/// The three authorizer constructors the selector dispatches to.
pub trait AuthorizerFactory {
    type Authorizer;

    fn authorizer_from_environment(&self) -> Result<Self::Authorizer>;

    /// `resource_manager_endpoint` is the base URI tokens are requested for.
    fn authorizer_from_file(&self, resource_manager_endpoint: &str) -> Result<Self::Authorizer>;

    fn authorizer_from_cli(&self) -> Result<Self::Authorizer>;
}

impl<F: AuthorizerFactory + ?Sized> AuthorizerFactory for &F {
    type Authorizer = F::Authorizer;

    fn authorizer_from_environment(&self) -> Result<Self::Authorizer> {
        (**self).authorizer_from_environment()
    }

    fn authorizer_from_file(&self, resource_manager_endpoint: &str) -> Result<Self::Authorizer> {
        (**self).authorizer_from_file(resource_manager_endpoint)
    }

    fn authorizer_from_cli(&self) -> Result<Self::Authorizer> {
        (**self).authorizer_from_cli()
    }
}

/// Environment-driven authorizer selection.
///
/// ## Example
/// ```rust,ignore
/// use azure_authorizer::{AuthorizerSelector, EnvVarNames};
///
/// let authorizer = AuthorizerSelector::builder()
///     .names(EnvVarNames::azure())
///     .build()
///     .select()?;
/// let header = authorizer.authorization_header()?;
/// ```
pub struct AuthorizerSelector<F> {
    env: Env,
    names: EnvVarNames,
    factory: F,
}

impl AuthorizerSelector<SdkAuthorizerFactory> {
    pub fn builder() -> Builder {
        Builder::default()
    }
}

impl<F: AuthorizerFactory> AuthorizerSelector<F> {
    pub fn new(env: Env, names: EnvVarNames, factory: F) -> Self {
        Self {
            env,
            names,
            factory,
        }
    }

    pub fn names(&self) -> &EnvVarNames {
        &self.names
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The method [`select`](Self::select) would use right now.
    pub fn method(&self) -> AuthMethod {
        select_method(&self.env, &self.names)
    }

    /// Calls exactly one constructor and returns its result verbatim.
    pub fn select(&self) -> Result<F::Authorizer> {
        let method = self.method();
        debug!(
            method = %method,
            client_id_var = %self.names.client_id,
            auth_location_var = %self.names.auth_location,
            "selected Azure auth method"
        );
        match method {
            AuthMethod::Environment => self.factory.authorizer_from_environment(),
            AuthMethod::File => self.factory.authorizer_from_file(DEFAULT_RESOURCE_MANAGER_ENDPOINT),
            AuthMethod::Cli => self.factory.authorizer_from_cli(),
        }
    }
}

/// Builder for an [`AuthorizerSelector`] backed by the built-in authorizers.
#[derive(Default)]
pub struct Builder {
    env: Option<Env>,
    names: Option<EnvVarNames>,
    http: Option<reqwest::blocking::Client>,
    cli_runner: Option<Arc<dyn CliRunner>>,
}

impl Builder {
    /// Variable names to look for; `ARM_*` when unset.
    pub fn names(mut self, names: EnvVarNames) -> Self {
        self.names = Some(names);
        self
    }

    /// Share an HTTP client with the service principal authorizers.
    pub fn http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Override how the Azure CLI is invoked.
    pub fn cli_runner(mut self, runner: Arc<dyn CliRunner>) -> Self {
        self.cli_runner = Some(runner);
        self
    }

    #[doc(hidden)]
    /// Override the environment used for selection and construction
    ///
    /// This method exists primarily for testing
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    pub fn build(self) -> AuthorizerSelector<SdkAuthorizerFactory> {
        let env = self.env.unwrap_or_default();
        let names = self.names.unwrap_or_default();
        let mut factory = SdkAuthorizerFactory::new(env.clone(), names.clone());
        if let Some(http) = self.http {
            factory = factory.with_http_client(http);
        }
        if let Some(runner) = self.cli_runner {
            factory = factory.with_cli_runner(runner);
        }
        AuthorizerSelector::new(env, names, factory)
    }
}

/// Builds an authorizer from the process environment using the `ARM_*` names.
pub fn new_authorizer() -> Result<Box<dyn Authorizer>> {
    AuthorizerSelector::builder().build().select()
}
