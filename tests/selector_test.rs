use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use azure_authorizer::authorizer::{CliOutput, CliRunner};
use azure_authorizer::{
    AuthError, AuthMethod, Authorizer, AuthorizerFactory, AuthorizerSelector, Env, EnvVarNames,
    Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Environment,
    File(String),
    Cli,
}

/// Records every constructor call and answers with a canned result.
struct RecordingFactory {
    calls: Mutex<Vec<Call>>,
    fail_with: Option<AuthError>,
}

impl RecordingFactory {
    fn ok() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    fn failing(err: AuthError) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(err),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: Call, handle: &'static str) -> Result<&'static str> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(handle),
        }
    }
}

impl AuthorizerFactory for RecordingFactory {
    type Authorizer = &'static str;

    fn authorizer_from_environment(&self) -> Result<Self::Authorizer> {
        self.answer(Call::Environment, "env-handle")
    }

    fn authorizer_from_file(&self, resource_manager_endpoint: &str) -> Result<Self::Authorizer> {
        self.answer(Call::File(resource_manager_endpoint.to_string()), "file-handle")
    }

    fn authorizer_from_cli(&self) -> Result<Self::Authorizer> {
        self.answer(Call::Cli, "cli-handle")
    }
}

fn service_principal_env(extra: &[(&'static str, &'static str)]) -> Env {
    let mut vars = vec![
        ("ARM_CLIENT_ID", "cid"),
        ("ARM_CLIENT_SECRET", "secret"),
        ("ARM_SUBSCRIPTION_ID", "sub"),
        ("ARM_TENANT_ID", "tid"),
    ];
    vars.extend_from_slice(extra);
    Env::from_slice(&vars)
}

#[test]
fn service_principal_vars_use_environment_constructor() {
    let factory = RecordingFactory::ok();
    let selector = AuthorizerSelector::new(service_principal_env(&[]), EnvVarNames::arm(), &factory);

    assert_eq!(selector.select().unwrap(), "env-handle");
    assert_eq!(factory.calls(), vec![Call::Environment]);
}

#[test]
fn environment_wins_over_file() {
    let factory = RecordingFactory::ok();
    let env = service_principal_env(&[("ARM_AUTH_LOCATION", "/etc/azure.json")]);
    let selector = AuthorizerSelector::new(env, EnvVarNames::arm(), &factory);

    assert_eq!(selector.method(), AuthMethod::Environment);
    assert_eq!(selector.select().unwrap(), "env-handle");
    assert_eq!(factory.calls(), vec![Call::Environment]);
}

#[test]
fn only_file_var_uses_file_constructor_with_public_endpoint() {
    let factory = RecordingFactory::ok();
    let env = Env::from_slice(&[("ARM_AUTH_LOCATION", "/etc/azure.json")]);
    let selector = AuthorizerSelector::new(env, EnvVarNames::arm(), &factory);

    assert_eq!(selector.select().unwrap(), "file-handle");
    assert_eq!(
        factory.calls(),
        vec![Call::File("https://management.azure.com/".to_string())]
    );
}

#[test]
fn partial_service_principal_falls_back_to_file() {
    let factory = RecordingFactory::ok();
    let env = Env::from_slice(&[
        ("ARM_CLIENT_ID", "cid"),
        ("ARM_CLIENT_SECRET", "secret"),
        ("ARM_TENANT_ID", "tid"),
        ("ARM_AUTH_LOCATION", "/etc/azure.json"),
    ]);
    let selector = AuthorizerSelector::new(env, EnvVarNames::arm(), &factory);

    assert_eq!(selector.select().unwrap(), "file-handle");
    assert_eq!(factory.calls().len(), 1);
}

#[test]
fn no_vars_use_cli_constructor() {
    let factory = RecordingFactory::ok();
    let selector = AuthorizerSelector::new(Env::from_slice(&[]), EnvVarNames::arm(), &factory);

    assert_eq!(selector.select().unwrap(), "cli-handle");
    assert_eq!(factory.calls(), vec![Call::Cli]);
}

#[test]
fn constructor_error_is_returned_verbatim() {
    let err = AuthError::TokenRequestFailed {
        status: 401,
        message: "AADSTS7000215: Invalid client secret provided.".to_string(),
    };
    let factory = RecordingFactory::failing(err.clone());
    let selector = AuthorizerSelector::new(service_principal_env(&[]), EnvVarNames::arm(), &factory);

    assert_eq!(selector.select().unwrap_err(), err);
    assert_eq!(factory.calls(), vec![Call::Environment]);
}

#[test]
fn each_select_makes_exactly_one_call() {
    let factory = RecordingFactory::ok();
    let selector = AuthorizerSelector::new(Env::from_slice(&[]), EnvVarNames::arm(), &factory);

    for _ in 0..3 {
        selector.select().unwrap();
    }
    assert_eq!(factory.calls(), vec![Call::Cli, Call::Cli, Call::Cli]);
}

#[test]
fn azure_prefix_reads_azure_names() {
    let factory = RecordingFactory::ok();
    let env = Env::from_slice(&[("AZURE_AUTH_LOCATION", "/etc/azure.json")]);

    let arm = AuthorizerSelector::new(env.clone(), EnvVarNames::arm(), &factory);
    assert_eq!(arm.method(), AuthMethod::Cli);

    let azure = AuthorizerSelector::new(env, EnvVarNames::azure(), &factory);
    assert_eq!(azure.select().unwrap(), "file-handle");
}

#[test]
fn concurrent_selects_each_call_one_constructor() {
    let factory = RecordingFactory::ok();
    let selector = AuthorizerSelector::new(service_principal_env(&[]), EnvVarNames::arm(), &factory);

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..4 {
                    assert_eq!(selector.select().unwrap(), "env-handle");
                }
            });
        }
    });

    assert_eq!(factory.calls(), vec![Call::Environment; 32]);
}

struct FakeAz {
    stdout: &'static str,
}

impl CliRunner for FakeAz {
    fn run(&self, _program: &str, _args: &[&str]) -> std::io::Result<CliOutput> {
        Ok(CliOutput {
            success: true,
            stdout: self.stdout.to_string(),
            stderr: String::new(),
        })
    }
}

#[test]
fn builder_falls_back_to_cli_session() {
    let selector = AuthorizerSelector::builder()
        .env(Env::from_slice(&[]))
        .cli_runner(Arc::new(FakeAz {
            stdout: r#"{"accessToken":"from-az","expiresOn":"2099-12-31 23:59:59.000000"}"#,
        }))
        .build();

    assert_eq!(selector.method(), AuthMethod::Cli);
    let auth = selector.select().ok().unwrap();
    assert_eq!(auth.authorization_header().unwrap(), "Bearer from-az");
}

#[test]
fn builder_surfaces_bad_auth_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let env = Env::from_map([("ARM_AUTH_LOCATION".to_string(), path)].into_iter().collect());
    let selector = AuthorizerSelector::builder().env(env).build();

    assert_eq!(selector.method(), AuthMethod::File);
    let err = selector.select().err().unwrap();
    assert!(matches!(err, AuthError::ParseError(_)), "got {err:?}");
}

#[test]
fn builder_rejects_empty_service_principal_values() {
    let env = Env::from_slice(&[
        ("ARM_CLIENT_ID", ""),
        ("ARM_CLIENT_SECRET", "secret"),
        ("ARM_SUBSCRIPTION_ID", "sub"),
        ("ARM_TENANT_ID", "tid"),
    ]);
    let selector = AuthorizerSelector::builder().env(env).build();

    assert_eq!(selector.method(), AuthMethod::Environment);
    let err = selector.select().err().unwrap();
    assert_eq!(
        err,
        AuthError::ConfigurationError("ARM_CLIENT_ID is not set or empty".to_string())
    );
}
