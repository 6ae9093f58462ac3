//! Converges the sites of a server to the deployment file.
//!
//! Sites are handled one at a time in declaration order. For each site the
//! remote state is read, only the calls needed to reach the declared state are
//! issued, and every mutation of a status-bearing entity is followed by a poll
//! until the provider reports the terminal status, before any dependent step
//! runs. The first failure aborts the whole run; nothing is rolled back.

mod certificate;
mod daemons;
mod deploy;
mod php;
mod poll;
mod site;

use crate::{
    config::{DeploymentConfig, SiteConfig},
    error::{Error, Result},
    forge::{ForgeApi, Id},
    handlebars::create_new_handlebars,
    secrets::Secrets,
    wait::{Backoff, Retries},
    workspace::Workspace,
};
use handlebars::Handlebars;
use log::{debug, info};

pub struct Reconciler<'a, A: ForgeApi> {
    api: &'a A,
    workspace: &'a Workspace,
    secrets: &'a Secrets,
    handlebars: Handlebars<'a>,
    backoff: Backoff,
}

impl<'a, A: ForgeApi> Reconciler<'a, A> {
    pub fn new(api: &'a A, workspace: &'a Workspace, secrets: &'a Secrets) -> Result<Self> {
        Ok(Reconciler {
            api,
            workspace,
            secrets,
            handlebars: create_new_handlebars()?,
            backoff: Backoff::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn run(&self, config: &DeploymentConfig) -> Result<()> {
        let server = self.resolve_server(&config.server_name)?;

        for site in &config.sites {
            info!("---- Site: {} ----", site.site_domain);
            self.reconcile_site(server, config, site)
                .map_err(|e| e.in_site(&site.site_domain))?;
        }

        Ok(())
    }

    fn resolve_server(&self, name: &str) -> Result<Id> {
        let server = self
            .api
            .list_servers()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::ServerNotFound(name.to_owned()))?;
        debug!("server `{name}` has id {}", server.id);
        Ok(server.id)
    }

    fn reconcile_site(&self, server: Id, config: &DeploymentConfig, conf: &SiteConfig) -> Result<()> {
        let site = self.resolve_site(server, conf)?;
        debug!("site: {site:?}");

        self.converge_aliases(server, &site, conf)?;
        self.apply_custom_nginx_config(server, site.id, conf)?;

        let site = self.converge_php(server, site.id, conf)?;
        self.attach_repository(server, &site, config, conf)?;

        let daemon_ids = self.converge_daemons(server, conf)?;
        self.converge_scheduler(server, &site, conf)?;

        self.push_deployment_script(server, site.id, conf, &daemon_ids)?;
        self.push_environment(server, site.id, conf)?;
        self.converge_certificate(server, site.id, conf)?;
        self.deploy(server, site.id, conf)
    }

    /// Polls `check` with the backoff policy; running out of retries is a
    /// timeout for `operation`.
    fn await_ready<F>(&self, operation: &str, retries: Retries, check: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        if self.backoff.wait(check, retries)? {
            Ok(())
        } else {
            Err(Error::timeout(operation))
        }
    }
}
