//! Typed access to the Laravel Forge API.
//!
//! [`ForgeApi`] is the seam between the reconciler and the provider: every
//! method is exactly one HTTP call, fails with [`Error::RemoteApi`] naming the
//! operation, and never retries. Polling and retry policy belong to the caller.
//!
//! [`Error::RemoteApi`]: crate::error::Error::RemoteApi

mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;

pub use client::{ForgeClient, DEFAULT_API_URL};
pub use models::*;

use crate::error::Result;

pub trait ForgeApi {
    // servers
    fn list_servers(&self) -> Result<Vec<Server>>;

    // sites
    fn list_sites(&self, server: Id) -> Result<Vec<Site>>;
    fn get_site(&self, server: Id, site: Id) -> Result<Site>;
    fn create_site(&self, server: Id, payload: &CreateSite) -> Result<Site>;
    fn update_site_aliases(&self, server: Id, site: Id, aliases: &[String]) -> Result<Site>;

    // nginx
    fn list_nginx_templates(&self, server: Id) -> Result<Vec<NginxTemplate>>;
    fn get_nginx_template(&self, server: Id, template: Id) -> Result<NginxTemplate>;
    fn create_nginx_template(&self, server: Id, name: &str, content: &str) -> Result<NginxTemplate>;
    fn update_nginx_template(&self, server: Id, template: Id, content: &str) -> Result<()>;
    fn get_nginx_config(&self, server: Id, site: Id) -> Result<String>;
    fn set_nginx_config(&self, server: Id, site: Id, content: &str) -> Result<()>;

    // php
    fn list_php_versions(&self, server: Id) -> Result<Vec<PhpVersion>>;
    fn install_php_version(&self, server: Id, version: &str) -> Result<()>;
    fn set_site_php_version(&self, server: Id, site: Id, version: &str) -> Result<()>;

    // git
    fn install_repository(&self, server: Id, site: Id, payload: &InstallRepository) -> Result<Site>;

    // daemons
    fn list_daemons(&self, server: Id) -> Result<Vec<Daemon>>;
    fn create_daemon(&self, server: Id, payload: &CreateDaemon) -> Result<Daemon>;
    fn delete_daemon(&self, server: Id, daemon: Id) -> Result<()>;

    // scheduled jobs
    fn list_jobs(&self, server: Id) -> Result<Vec<Job>>;
    fn create_job(&self, server: Id, payload: &CreateJob) -> Result<Job>;
    fn delete_job(&self, server: Id, job: Id) -> Result<()>;

    // certificates
    fn list_certificates(&self, server: Id, site: Id) -> Result<Vec<Certificate>>;
    fn get_certificate(&self, server: Id, site: Id, certificate: Id) -> Result<Certificate>;
    fn create_letsencrypt_certificate(&self, server: Id, site: Id, domains: &[String]) -> Result<Certificate>;
    fn activate_certificate(&self, server: Id, site: Id, certificate: Id) -> Result<()>;

    // deployment
    fn get_deployment_script(&self, server: Id, site: Id) -> Result<String>;
    fn update_deployment_script(&self, server: Id, site: Id, content: &str, auto_source: bool) -> Result<()>;
    fn get_env(&self, server: Id, site: Id) -> Result<String>;
    fn update_env(&self, server: Id, site: Id, content: &str) -> Result<()>;
    fn deploy(&self, server: Id, site: Id) -> Result<Site>;
    fn deployment_log(&self, server: Id, site: Id) -> Result<String>;
    fn list_deployments(&self, server: Id, site: Id) -> Result<Vec<Deployment>>;
}
