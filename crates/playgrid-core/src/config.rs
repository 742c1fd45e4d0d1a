//! playgrid.toml configuration parser.
//!
//! Every section and key is optional; missing values fall back to the
//! defaults below, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::manifest::{GpuShare, WorkloadTemplate};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub cluster: ClusterConfig,
    pub workload: WorkloadConfig,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub namespace: String,
    pub storage_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    pub image: String,
    pub container_name: String,
    pub port: u16,
    /// Extended resource name for the shared GPU. Empty disables it.
    pub gpu_resource: String,
    pub gpu_amount: u32,
    pub timezone: String,
    pub locales: String,
    pub display: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Drop credentials older than this. Unset keeps them for the
    /// lifetime of the process.
    pub max_age_secs: Option<u64>,
    pub prune_interval_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            storage_class: WorkloadTemplate::default().storage_class,
        }
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        let t = WorkloadTemplate::default();
        let (gpu_resource, gpu_amount) = t
            .gpu
            .map(|g| (g.resource, g.amount))
            .unwrap_or_default();
        Self {
            image: t.image,
            container_name: t.container_name,
            port: t.port,
            gpu_resource,
            gpu_amount,
            timezone: t.timezone,
            locales: t.locales,
            display: t.display,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("cluster.namespace is empty".into()));
        }
        if let Some(0) = self.credentials.max_age_secs {
            return Err(ConfigError::Invalid(
                "credentials.max_age_secs must be greater than zero".into(),
            ));
        }
        if let Some(0) = self.credentials.prune_interval_secs {
            return Err(ConfigError::Invalid(
                "credentials.prune_interval_secs must be greater than zero".into(),
            ));
        }
        self.workload_template()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Fixed workload settings derived from the `[cluster]` and `[workload]`
    /// sections.
    pub fn workload_template(&self) -> WorkloadTemplate {
        let w = &self.workload;
        let gpu = (!w.gpu_resource.is_empty()).then(|| GpuShare {
            resource: w.gpu_resource.clone(),
            amount: w.gpu_amount,
        });
        WorkloadTemplate {
            storage_class: self.cluster.storage_class.clone(),
            image: w.image.clone(),
            container_name: w.container_name.clone(),
            port: w.port,
            gpu,
            timezone: w.timezone.clone(),
            locales: w.locales.clone(),
            display: w.display.clone(),
        }
    }
}
