//! Blocking HTTP implementation of [`ForgeApi`].

use super::{models::*, ForgeApi};
use crate::error::{ApiFailure, Error, Result};
use log::trace;
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::{self, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://forge.laravel.com/api/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One pooled connection set for the whole run.
#[derive(Debug, Clone)]
pub struct ForgeClient {
    client: Client,
    base_url: String,
}

impl ForgeClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config("FORGE_API_TOKEN contains invalid characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::remote("build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|e| Error::remote(operation, e))?;
        let status = response.status();
        trace!("{operation}: HTTP {status}");

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::remote(operation, ApiFailure::Status { status, body }));
        }

        Ok(response)
    }

    fn text(&self, operation: &str, request: RequestBuilder) -> Result<String> {
        self.send(operation, request)?
            .text()
            .map_err(|e| Error::remote(operation, e))
    }

    fn json<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        let body = self.text(operation, request)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::remote(operation, ApiFailure::Decode(e.to_string())))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }
}

impl ForgeApi for ForgeClient {
    fn list_servers(&self) -> Result<Vec<Server>> {
        let env: ServersEnvelope = self.json("list servers", self.get("/servers"))?;
        Ok(env.servers)
    }

    fn list_sites(&self, server: Id) -> Result<Vec<Site>> {
        let env: SitesEnvelope =
            self.json("list sites", self.get(&format!("/servers/{server}/sites")))?;
        Ok(env.sites)
    }

    fn get_site(&self, server: Id, site: Id) -> Result<Site> {
        let env: SiteEnvelope =
            self.json("get site", self.get(&format!("/servers/{server}/sites/{site}")))?;
        Ok(env.site)
    }

    fn create_site(&self, server: Id, payload: &CreateSite) -> Result<Site> {
        let env: SiteEnvelope = self.json(
            "create site",
            self.post(&format!("/servers/{server}/sites")).json(payload),
        )?;
        Ok(env.site)
    }

    fn update_site_aliases(&self, server: Id, site: Id, aliases: &[String]) -> Result<Site> {
        let env: SiteEnvelope = self.json(
            "update site aliases",
            self.put(&format!("/servers/{server}/sites/{site}"))
                .json(&json!({ "aliases": aliases })),
        )?;
        Ok(env.site)
    }

    fn list_nginx_templates(&self, server: Id) -> Result<Vec<NginxTemplate>> {
        let env: TemplatesEnvelope = self.json(
            "list nginx templates",
            self.get(&format!("/servers/{server}/nginx/templates")),
        )?;
        Ok(env.templates)
    }

    fn get_nginx_template(&self, server: Id, template: Id) -> Result<NginxTemplate> {
        let env: TemplateEnvelope = self.json(
            "get nginx template",
            self.get(&format!("/servers/{server}/nginx/templates/{template}")),
        )?;
        Ok(env.template)
    }

    fn create_nginx_template(&self, server: Id, name: &str, content: &str) -> Result<NginxTemplate> {
        let env: TemplateEnvelope = self.json(
            "create nginx template",
            self.post(&format!("/servers/{server}/nginx/templates"))
                .json(&json!({ "name": name, "content": content })),
        )?;
        Ok(env.template)
    }

    fn update_nginx_template(&self, server: Id, template: Id, content: &str) -> Result<()> {
        self.send(
            "update nginx template",
            self.put(&format!("/servers/{server}/nginx/templates/{template}"))
                .json(&json!({ "content": content })),
        )?;
        Ok(())
    }

    fn get_nginx_config(&self, server: Id, site: Id) -> Result<String> {
        self.text(
            "get nginx config",
            self.get(&format!("/servers/{server}/sites/{site}/nginx")),
        )
    }

    fn set_nginx_config(&self, server: Id, site: Id, content: &str) -> Result<()> {
        self.send(
            "set nginx config",
            self.put(&format!("/servers/{server}/sites/{site}/nginx"))
                .json(&json!({ "content": content })),
        )?;
        Ok(())
    }

    fn list_php_versions(&self, server: Id) -> Result<Vec<PhpVersion>> {
        self.json(
            "list php versions",
            self.get(&format!("/servers/{server}/php")),
        )
    }

    fn install_php_version(&self, server: Id, version: &str) -> Result<()> {
        self.send(
            "install php version",
            self.post(&format!("/servers/{server}/php"))
                .json(&json!({ "version": version })),
        )?;
        Ok(())
    }

    fn set_site_php_version(&self, server: Id, site: Id, version: &str) -> Result<()> {
        self.send(
            "update site php version",
            self.put(&format!("/servers/{server}/sites/{site}/php"))
                .json(&json!({ "version": version })),
        )?;
        Ok(())
    }

    fn install_repository(&self, server: Id, site: Id, payload: &InstallRepository) -> Result<Site> {
        let env: SiteEnvelope = self.json(
            "install repository",
            self.post(&format!("/servers/{server}/sites/{site}/git"))
                .json(payload),
        )?;
        Ok(env.site)
    }

    fn list_daemons(&self, server: Id) -> Result<Vec<Daemon>> {
        let env: DaemonsEnvelope =
            self.json("list daemons", self.get(&format!("/servers/{server}/daemons")))?;
        Ok(env.daemons)
    }

    fn create_daemon(&self, server: Id, payload: &CreateDaemon) -> Result<Daemon> {
        let env: DaemonEnvelope = self.json(
            "create daemon",
            self.post(&format!("/servers/{server}/daemons")).json(payload),
        )?;
        Ok(env.daemon)
    }

    fn delete_daemon(&self, server: Id, daemon: Id) -> Result<()> {
        self.send(
            "delete daemon",
            self.delete(&format!("/servers/{server}/daemons/{daemon}")),
        )?;
        Ok(())
    }

    fn list_jobs(&self, server: Id) -> Result<Vec<Job>> {
        let env: JobsEnvelope =
            self.json("list scheduled jobs", self.get(&format!("/servers/{server}/jobs")))?;
        Ok(env.jobs)
    }

    fn create_job(&self, server: Id, payload: &CreateJob) -> Result<Job> {
        let env: JobEnvelope = self.json(
            "create scheduled job",
            self.post(&format!("/servers/{server}/jobs")).json(payload),
        )?;
        Ok(env.job)
    }

    fn delete_job(&self, server: Id, job: Id) -> Result<()> {
        self.send(
            "delete scheduled job",
            self.delete(&format!("/servers/{server}/jobs/{job}")),
        )?;
        Ok(())
    }

    fn list_certificates(&self, server: Id, site: Id) -> Result<Vec<Certificate>> {
        let env: CertificatesEnvelope = self.json(
            "list certificates",
            self.get(&format!("/servers/{server}/sites/{site}/certificates")),
        )?;
        Ok(env.certificates)
    }

    fn get_certificate(&self, server: Id, site: Id, certificate: Id) -> Result<Certificate> {
        let env: CertificateEnvelope = self.json(
            "get certificate",
            self.get(&format!(
                "/servers/{server}/sites/{site}/certificates/{certificate}"
            )),
        )?;
        Ok(env.certificate)
    }

    fn create_letsencrypt_certificate(&self, server: Id, site: Id, domains: &[String]) -> Result<Certificate> {
        let env: CertificateEnvelope = self.json(
            "create certificate",
            self.post(&format!(
                "/servers/{server}/sites/{site}/certificates/letsencrypt"
            ))
            .json(&json!({ "domains": domains })),
        )?;
        Ok(env.certificate)
    }

    fn activate_certificate(&self, server: Id, site: Id, certificate: Id) -> Result<()> {
        self.send(
            "activate certificate",
            self.post(&format!(
                "/servers/{server}/sites/{site}/certificates/{certificate}/activate"
            )),
        )?;
        Ok(())
    }

    fn get_deployment_script(&self, server: Id, site: Id) -> Result<String> {
        self.text(
            "get deployment script",
            self.get(&format!("/servers/{server}/sites/{site}/deployment/script")),
        )
    }

    fn update_deployment_script(&self, server: Id, site: Id, content: &str, auto_source: bool) -> Result<()> {
        self.send(
            "update deployment script",
            self.put(&format!("/servers/{server}/sites/{site}/deployment/script"))
                .json(&json!({ "content": content, "auto_source": auto_source })),
        )?;
        Ok(())
    }

    fn get_env(&self, server: Id, site: Id) -> Result<String> {
        self.text(
            "get environment file",
            self.get(&format!("/servers/{server}/sites/{site}/env")),
        )
    }

    fn update_env(&self, server: Id, site: Id, content: &str) -> Result<()> {
        self.send(
            "update environment file",
            self.put(&format!("/servers/{server}/sites/{site}/env"))
                .json(&json!({ "content": content })),
        )?;
        Ok(())
    }

    fn deploy(&self, server: Id, site: Id) -> Result<Site> {
        let env: SiteEnvelope = self.json(
            "deploy site",
            self.post(&format!("/servers/{server}/sites/{site}/deployment/deploy")),
        )?;
        Ok(env.site)
    }

    fn deployment_log(&self, server: Id, site: Id) -> Result<String> {
        self.text(
            "get deployment log",
            self.get(&format!("/servers/{server}/sites/{site}/deployment/log")),
        )
    }

    fn list_deployments(&self, server: Id, site: Id) -> Result<Vec<Deployment>> {
        let env: DeploymentsEnvelope = self.json(
            "get deployment history",
            self.get(&format!("/servers/{server}/sites/{site}/deployment-history")),
        )?;
        Ok(env.deployments)
    }
}
