//! In-memory provider for reconciler tests.
//!
//! Asynchronous operations (site install, repository attach, php install,
//! certificate issue, deploy) report their in-progress status on the first
//! read after the mutation and their terminal status afterwards, so every
//! wait has to poll at least twice.

use super::{models::*, ForgeApi};
use crate::error::{ApiFailure, Error, Result};
use reqwest::StatusCode;
use std::{cell::RefCell, collections::HashMap};

#[derive(Debug, Default)]
pub struct State {
    next_id: Id,
    pub servers: Vec<Server>,
    pub sites: Vec<Site>,
    pub templates: Vec<NginxTemplate>,
    pub nginx: HashMap<Id, String>,
    pub php: Vec<PhpVersion>,
    pub daemons: Vec<Daemon>,
    pub jobs: Vec<Job>,
    pub certificates: HashMap<Id, Vec<Certificate>>,
    pub scripts: HashMap<Id, String>,
    pub envs: HashMap<Id, String>,
    pub deployments: HashMap<Id, Vec<Deployment>>,
    /// Deployment log per site; missing means the provider answers 404.
    pub logs: HashMap<Id, String>,
    /// Whether the next deployment reports `failed`.
    pub fail_deployments: bool,
    /// Generated nginx config for new sites.
    pub generated_nginx: String,
    /// Entities whose async operation finishes on their next read.
    settling: Vec<(&'static str, Id)>,
}

impl State {
    fn id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    /// First read after a mutation still sees the pending status.
    fn settle(&mut self, kind: &'static str, id: Id) -> bool {
        if let Some(pos) = self.settling.iter().position(|e| *e == (kind, id)) {
            self.settling.remove(pos);
            false
        } else {
            true
        }
    }

    fn site_mut(&mut self, id: Id) -> Result<&mut Site> {
        self.sites
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("get site"))
    }
}

fn not_found(operation: &str) -> Error {
    Error::remote(
        operation,
        ApiFailure::Status {
            status: StatusCode::NOT_FOUND,
            body: "Not Found".to_owned(),
        },
    )
}

#[derive(Debug, Default)]
pub struct FakeForge {
    pub state: RefCell<State>,
    calls: RefCell<Vec<String>>,
}

impl FakeForge {
    pub fn with_server(name: &str) -> Self {
        let fake = FakeForge::default();
        {
            let mut state = fake.state.borrow_mut();
            let id = state.id();
            state.servers.push(Server {
                id,
                name: name.to_owned(),
            });
            state.next_id = 100;
        }
        fake
    }

    pub fn add_template(&self, name: &str, content: &str) -> Id {
        let mut state = self.state.borrow_mut();
        let id = state.id();
        state.templates.push(NginxTemplate {
            id,
            name: name.to_owned(),
            content: content.to_owned(),
        });
        id
    }

    pub fn add_site(&self, site: Site) -> Id {
        let mut state = self.state.borrow_mut();
        let id = state.id();
        state.sites.push(Site { id, ..site });
        id
    }

    pub fn add_daemon(&self, command: &str, directory: &str) -> Id {
        let mut state = self.state.borrow_mut();
        let id = state.id();
        state.daemons.push(Daemon {
            id,
            command: command.to_owned(),
            directory: Some(directory.to_owned()),
        });
        id
    }

    pub fn add_certificate(&self, site: Id, domain: &str, active: bool) -> Id {
        let mut state = self.state.borrow_mut();
        let id = state.id();
        state.certificates.entry(site).or_default().push(Certificate {
            id,
            domain: domain.to_owned(),
            status: Some("installed".to_owned()),
            active,
        });
        id
    }

    pub fn site(&self, domain: &str) -> Option<Site> {
        self.state
            .borrow()
            .sites
            .iter()
            .find(|s| s.name == domain)
            .cloned()
    }

    /// Every call so far, e.g. `create_site example.com`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls that change provider state.
    pub fn mutations(&self) -> Vec<String> {
        const READS: &[&str] = &["list_", "get_", "deployment_log"];
        self.calls()
            .into_iter()
            .filter(|c| !READS.iter().any(|r| c.starts_with(r)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl ForgeApi for FakeForge {
    fn list_servers(&self) -> Result<Vec<Server>> {
        self.record("list_servers");
        Ok(self.state.borrow().servers.clone())
    }

    fn list_sites(&self, _server: Id) -> Result<Vec<Site>> {
        self.record("list_sites");
        Ok(self.state.borrow().sites.clone())
    }

    fn get_site(&self, _server: Id, site: Id) -> Result<Site> {
        self.record("get_site");
        let mut state = self.state.borrow_mut();
        if state.settle("site", site) {
            let site = state.site_mut(site)?;
            site.status = Some("installed".to_owned());
            if site.repository.is_some() {
                site.repository_status = Some("installed".to_owned());
            }
            site.deployment_status = None;
        }
        Ok(state.site_mut(site)?.clone())
    }

    fn create_site(&self, _server: Id, payload: &CreateSite) -> Result<Site> {
        self.record(format!("create_site {}", payload.domain));
        let mut state = self.state.borrow_mut();
        let id = state.id();
        let site = Site {
            id,
            name: payload.domain.clone(),
            aliases: payload.aliases.clone(),
            status: Some("installing".to_owned()),
            php_version: Some("php83".to_owned()),
            ..Site::default()
        };
        let generated = state.generated_nginx.clone();
        state.nginx.insert(id, generated);
        state.sites.push(site.clone());
        state.settling.push(("site", id));
        Ok(site)
    }

    fn update_site_aliases(&self, _server: Id, site: Id, aliases: &[String]) -> Result<Site> {
        self.record(format!("update_site_aliases {}", aliases.join(",")));
        let mut state = self.state.borrow_mut();
        let site = state.site_mut(site)?;
        site.aliases = aliases.to_vec();
        Ok(site.clone())
    }

    fn list_nginx_templates(&self, _server: Id) -> Result<Vec<NginxTemplate>> {
        self.record("list_nginx_templates");
        Ok(self.state.borrow().templates.clone())
    }

    fn get_nginx_template(&self, _server: Id, template: Id) -> Result<NginxTemplate> {
        self.record("get_nginx_template");
        self.state
            .borrow()
            .templates
            .iter()
            .find(|t| t.id == template)
            .cloned()
            .ok_or_else(|| not_found("get nginx template"))
    }

    fn create_nginx_template(&self, _server: Id, name: &str, content: &str) -> Result<NginxTemplate> {
        self.record(format!("create_nginx_template {name}"));
        let mut state = self.state.borrow_mut();
        let id = state.id();
        let template = NginxTemplate {
            id,
            name: name.to_owned(),
            content: content.to_owned(),
        };
        state.templates.push(template.clone());
        Ok(template)
    }

    fn update_nginx_template(&self, _server: Id, template: Id, content: &str) -> Result<()> {
        self.record(format!("update_nginx_template {template}"));
        let mut state = self.state.borrow_mut();
        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == template)
            .ok_or_else(|| not_found("update nginx template"))?;
        template.content = content.to_owned();
        Ok(())
    }

    fn get_nginx_config(&self, _server: Id, site: Id) -> Result<String> {
        self.record("get_nginx_config");
        Ok(self.state.borrow().nginx.get(&site).cloned().unwrap_or_default())
    }

    fn set_nginx_config(&self, _server: Id, site: Id, content: &str) -> Result<()> {
        self.record("set_nginx_config");
        self.state.borrow_mut().nginx.insert(site, content.to_owned());
        Ok(())
    }

    fn list_php_versions(&self, _server: Id) -> Result<Vec<PhpVersion>> {
        self.record("list_php_versions");
        let mut state = self.state.borrow_mut();
        for idx in 0..state.php.len() {
            if !state.php[idx].is_installed() && state.settle("php", idx as Id) {
                state.php[idx].status = Some("installed".to_owned());
            }
        }
        Ok(state.php.clone())
    }

    fn install_php_version(&self, _server: Id, version: &str) -> Result<()> {
        self.record(format!("install_php_version {version}"));
        let mut state = self.state.borrow_mut();
        let idx = state.php.len() as Id;
        state.php.push(PhpVersion {
            version: version.to_owned(),
            status: Some("installing".to_owned()),
        });
        state.settling.push(("php", idx));
        Ok(())
    }

    fn set_site_php_version(&self, _server: Id, site: Id, version: &str) -> Result<()> {
        self.record(format!("set_site_php_version {version}"));
        self.state.borrow_mut().site_mut(site)?.php_version = Some(version.to_owned());
        Ok(())
    }

    fn install_repository(&self, _server: Id, site: Id, payload: &InstallRepository) -> Result<Site> {
        self.record(format!(
            "install_repository {}@{}",
            payload.repository, payload.branch
        ));
        let mut state = self.state.borrow_mut();
        state.settling.push(("site", site));
        let site = state.site_mut(site)?;
        site.repository = Some(payload.repository.clone());
        site.repository_status = Some("installing".to_owned());
        Ok(site.clone())
    }

    fn list_daemons(&self, _server: Id) -> Result<Vec<Daemon>> {
        self.record("list_daemons");
        Ok(self.state.borrow().daemons.clone())
    }

    fn create_daemon(&self, _server: Id, payload: &CreateDaemon) -> Result<Daemon> {
        self.record(format!("create_daemon {}", payload.command));
        let mut state = self.state.borrow_mut();
        let id = state.id();
        let daemon = Daemon {
            id,
            command: payload.command.clone(),
            directory: Some(payload.directory.clone()),
        };
        state.daemons.push(daemon.clone());
        Ok(daemon)
    }

    fn delete_daemon(&self, _server: Id, daemon: Id) -> Result<()> {
        self.record(format!("delete_daemon {daemon}"));
        self.state.borrow_mut().daemons.retain(|d| d.id != daemon);
        Ok(())
    }

    fn list_jobs(&self, _server: Id) -> Result<Vec<Job>> {
        self.record("list_jobs");
        Ok(self.state.borrow().jobs.clone())
    }

    fn create_job(&self, _server: Id, payload: &CreateJob) -> Result<Job> {
        self.record(format!("create_job {}", payload.command));
        let mut state = self.state.borrow_mut();
        let id = state.id();
        let job = Job {
            id,
            command: payload.command.clone(),
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    fn delete_job(&self, _server: Id, job: Id) -> Result<()> {
        self.record(format!("delete_job {job}"));
        self.state.borrow_mut().jobs.retain(|j| j.id != job);
        Ok(())
    }

    fn list_certificates(&self, _server: Id, site: Id) -> Result<Vec<Certificate>> {
        self.record("list_certificates");
        Ok(self
            .state
            .borrow()
            .certificates
            .get(&site)
            .cloned()
            .unwrap_or_default())
    }

    fn get_certificate(&self, _server: Id, site: Id, certificate: Id) -> Result<Certificate> {
        self.record("get_certificate");
        let mut state = self.state.borrow_mut();
        let done = state.settle("certificate", certificate);
        let cert = state
            .certificates
            .get_mut(&site)
            .and_then(|certs| certs.iter_mut().find(|c| c.id == certificate))
            .ok_or_else(|| not_found("get certificate"))?;
        if done {
            cert.status = Some("installed".to_owned());
        }
        Ok(cert.clone())
    }

    fn create_letsencrypt_certificate(&self, _server: Id, site: Id, domains: &[String]) -> Result<Certificate> {
        self.record(format!("create_letsencrypt_certificate {}", domains.join(",")));
        let mut state = self.state.borrow_mut();
        let id = state.id();
        let cert = Certificate {
            id,
            domain: domains.join(","),
            status: Some("installing".to_owned()),
            active: false,
        };
        state.certificates.entry(site).or_default().push(cert.clone());
        state.settling.push(("certificate", id));
        Ok(cert)
    }

    fn activate_certificate(&self, _server: Id, site: Id, certificate: Id) -> Result<()> {
        self.record(format!("activate_certificate {certificate}"));
        let mut state = self.state.borrow_mut();
        for cert in state.certificates.entry(site).or_default() {
            cert.active = cert.id == certificate;
        }
        Ok(())
    }

    fn get_deployment_script(&self, _server: Id, site: Id) -> Result<String> {
        self.record("get_deployment_script");
        Ok(self.state.borrow().scripts.get(&site).cloned().unwrap_or_default())
    }

    fn update_deployment_script(&self, _server: Id, site: Id, content: &str, auto_source: bool) -> Result<()> {
        self.record(format!("update_deployment_script auto_source={auto_source}"));
        self.state.borrow_mut().scripts.insert(site, content.to_owned());
        Ok(())
    }

    fn get_env(&self, _server: Id, site: Id) -> Result<String> {
        self.record("get_env");
        Ok(self.state.borrow().envs.get(&site).cloned().unwrap_or_default())
    }

    fn update_env(&self, _server: Id, site: Id, content: &str) -> Result<()> {
        self.record("update_env");
        self.state.borrow_mut().envs.insert(site, content.to_owned());
        Ok(())
    }

    fn deploy(&self, _server: Id, site: Id) -> Result<Site> {
        self.record("deploy");
        let mut state = self.state.borrow_mut();
        let id = state.id();
        let status = if state.fail_deployments { "failed" } else { "finished" };
        state.deployments.entry(site).or_default().insert(
            0,
            Deployment {
                id,
                status: Some(status.to_owned()),
            },
        );
        state.settling.push(("site", site));
        let site = state.site_mut(site)?;
        site.deployment_status = Some("deploying".to_owned());
        Ok(site.clone())
    }

    fn deployment_log(&self, _server: Id, site: Id) -> Result<String> {
        self.record("deployment_log");
        self.state
            .borrow()
            .logs
            .get(&site)
            .cloned()
            .ok_or_else(|| not_found("get deployment log"))
    }

    fn list_deployments(&self, _server: Id, site: Id) -> Result<Vec<Deployment>> {
        self.record("list_deployments");
        Ok(self
            .state
            .borrow()
            .deployments
            .get(&site)
            .cloned()
            .unwrap_or_default())
    }
}
