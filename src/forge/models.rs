//! Wire shapes of the Forge API. Only the fields the reconciler reads are
//! modelled; everything else in the payloads is ignored.

use serde::{Deserialize, Serialize};

pub type Id = u64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Server {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Site {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub repository_status: Option<String>,
    #[serde(default)]
    pub php_version: Option<String>,
    /// Non-null while a deployment is running.
    #[serde(default)]
    pub deployment_status: Option<String>,
}

impl Site {
    pub fn is_installed(&self) -> bool {
        self.status.as_deref() == Some("installed")
    }

    pub fn is_repository_installed(&self) -> bool {
        self.repository_status.as_deref() == Some("installed")
    }

    pub fn is_deploying(&self) -> bool {
        self.deployment_status.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSite {
    pub domain: String,
    pub project_type: String,
    pub aliases: Vec<String>,
    pub directory: String,
    pub isolated: bool,
    pub nginx_template: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NginxTemplate {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhpVersion {
    pub version: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl PhpVersion {
    pub fn is_installed(&self) -> bool {
        self.status.as_deref() == Some("installed")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallRepository {
    pub provider: String,
    pub repository: String,
    pub branch: String,
    pub composer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Daemon {
    pub id: Id,
    pub command: String,
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDaemon {
    pub command: String,
    pub user: String,
    pub directory: String,
    pub startsecs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Job {
    pub id: Id,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Minutely,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateJob {
    pub command: String,
    pub user: String,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Certificate {
    pub id: Id,
    /// Comma separated list of covered domains.
    pub domain: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl Certificate {
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domain.split(',').map(str::trim).filter(|d| !d.is_empty())
    }

    pub fn is_installed(&self) -> bool {
        self.status.as_deref() == Some("installed")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Deployment {
    pub id: Id,
    #[serde(default)]
    pub status: Option<String>,
}

impl Deployment {
    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("failed")
    }
}

// Response envelopes.

#[derive(Deserialize)]
pub(crate) struct ServersEnvelope {
    pub servers: Vec<Server>,
}

#[derive(Deserialize)]
pub(crate) struct SitesEnvelope {
    pub sites: Vec<Site>,
}

#[derive(Deserialize)]
pub(crate) struct SiteEnvelope {
    pub site: Site,
}

#[derive(Deserialize)]
pub(crate) struct TemplatesEnvelope {
    pub templates: Vec<NginxTemplate>,
}

#[derive(Deserialize)]
pub(crate) struct TemplateEnvelope {
    pub template: NginxTemplate,
}

#[derive(Deserialize)]
pub(crate) struct DaemonsEnvelope {
    pub daemons: Vec<Daemon>,
}

#[derive(Deserialize)]
pub(crate) struct DaemonEnvelope {
    pub daemon: Daemon,
}

#[derive(Deserialize)]
pub(crate) struct JobsEnvelope {
    pub jobs: Vec<Job>,
}

#[derive(Deserialize)]
pub(crate) struct JobEnvelope {
    pub job: Job,
}

#[derive(Deserialize)]
pub(crate) struct CertificatesEnvelope {
    pub certificates: Vec<Certificate>,
}

#[derive(Deserialize)]
pub(crate) struct CertificateEnvelope {
    pub certificate: Certificate,
}

#[derive(Deserialize)]
pub(crate) struct DeploymentsEnvelope {
    pub deployments: Vec<Deployment>,
}
