//! Variable names and cloud endpoint tables.

use crate::error::{AuthError, Result};

/// Resource Manager endpoint of the public cloud; the fixed base endpoint handed
/// to the file constructor.
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com/";

/// The five variables the selector looks at, plus the optional cloud name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarNames {
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub tenant_id: String,
    pub auth_location: String,
    /// Optional cloud name (e.g. `AzureChinaCloud`) read by the environment constructor.
    pub environment: String,
}

impl Default for EnvVarNames {
    fn default() -> Self {
        Self::arm()
    }
}

impl EnvVarNames {
    /// Builds the names for `{prefix}_CLIENT_ID` and friends.
    pub fn with_prefix(prefix: &str) -> Self {
        let p = prefix.trim_end_matches('_');
        Self {
            client_id: format!("{p}_CLIENT_ID"),
            client_secret: format!("{p}_CLIENT_SECRET"),
            subscription_id: format!("{p}_SUBSCRIPTION_ID"),
            tenant_id: format!("{p}_TENANT_ID"),
            auth_location: format!("{p}_AUTH_LOCATION"),
            environment: format!("{p}_ENVIRONMENT"),
        }
    }

    /// `ARM_*` names, as used by Terraform-style tooling.
    pub fn arm() -> Self {
        Self::with_prefix("ARM")
    }

    /// `AZURE_*` names, as used by the Azure SDKs.
    pub fn azure() -> Self {
        Self::with_prefix("AZURE")
    }

    /// The four names that must all be present for environment-based auth.
    pub fn service_principal(&self) -> [&str; 4] {
        [
            &self.client_id,
            &self.client_secret,
            &self.subscription_id,
            &self.tenant_id,
        ]
    }
}

/// Endpoints for one Azure cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEnvironment {
    pub name: &'static str,
    pub active_directory_endpoint: &'static str,
    pub resource_manager_endpoint: &'static str,
    pub management_endpoint: &'static str,
    pub graph_endpoint: &'static str,
    pub gallery_endpoint: &'static str,
}

pub const PUBLIC_CLOUD: CloudEnvironment = CloudEnvironment {
    name: "AzurePublicCloud",
    active_directory_endpoint: "https://login.microsoftonline.com/",
    resource_manager_endpoint: DEFAULT_RESOURCE_MANAGER_ENDPOINT,
    management_endpoint: "https://management.core.windows.net/",
    graph_endpoint: "https://graph.windows.net/",
    gallery_endpoint: "https://gallery.azure.com/",
};

pub const CHINA_CLOUD: CloudEnvironment = CloudEnvironment {
    name: "AzureChinaCloud",
    active_directory_endpoint: "https://login.chinacloudapi.cn/",
    resource_manager_endpoint: "https://management.chinacloudapi.cn/",
    management_endpoint: "https://management.core.chinacloudapi.cn/",
    graph_endpoint: "https://graph.chinacloudapi.cn/",
    gallery_endpoint: "https://gallery.chinacloudapi.cn/",
};

pub const US_GOVERNMENT_CLOUD: CloudEnvironment = CloudEnvironment {
    name: "AzureUSGovernmentCloud",
    active_directory_endpoint: "https://login.microsoftonline.us/",
    resource_manager_endpoint: "https://management.usgovcloudapi.net/",
    management_endpoint: "https://management.core.usgovcloudapi.net/",
    graph_endpoint: "https://graph.windows.net/",
    gallery_endpoint: "https://gallery.usgovcloudapi.net/",
};

impl Default for CloudEnvironment {
    fn default() -> Self {
        PUBLIC_CLOUD
    }
}

impl CloudEnvironment {
    /// Looks a cloud up by name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        [PUBLIC_CLOUD, CHINA_CLOUD, US_GOVERNMENT_CLOUD]
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                AuthError::ConfigurationError(format!("Unknown Azure environment: {wanted}"))
            })
    }
}

/// Compares two endpoint URIs ignoring case and a trailing slash.
pub(crate) fn same_endpoint(a: &str, b: &str) -> bool {
    a.trim_end_matches('/')
        .eq_ignore_ascii_case(b.trim_end_matches('/'))
}
