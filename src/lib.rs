//! # azure-authorizer
//!
//! Picks an Azure authorizer from whatever credentials the environment offers.
//!
//! Resolution order:
//! 1. `ARM_CLIENT_ID`, `ARM_CLIENT_SECRET`, `ARM_SUBSCRIPTION_ID` and `ARM_TENANT_ID`
//!    all present: service principal with client secret
//! 2. `ARM_AUTH_LOCATION` present: SDK auth file
//! 3. otherwise: the logged-in Azure CLI
//!
//! The `AZURE_*` spelling of the same variables is available via [`EnvVarNames::azure`].
//!
//! ```rust,ignore
//! let authorizer = azure_authorizer::new_authorizer()?;
//! let request = authorizer.authorize(client.get(url))?;
//! ```
#![deny(unsafe_code)]

pub mod authorizer;
pub mod config;
pub mod env;
pub mod error;
pub mod factory;
pub mod selector;
pub mod telemetry;

pub use authorizer::{Authorizer, StaticAuthorizer};
pub use config::{CloudEnvironment, DEFAULT_RESOURCE_MANAGER_ENDPOINT, EnvVarNames};
pub use env::Env;
pub use error::{AuthError, Result};
pub use factory::SdkAuthorizerFactory;
pub use selector::{AuthMethod, AuthorizerFactory, AuthorizerSelector, new_authorizer, select_method};
