use super::{poll, Reconciler};
use crate::{
    config::{SiteConfig, Variables},
    error::{Error, Result},
    forge::{CreateSite, ForgeApi, Id, Site},
    template::{render_nginx_variables, TemplateState},
    wait::Retries,
};
use log::{debug, info};
use std::collections::HashSet;

impl<A: ForgeApi> Reconciler<'_, A> {
    /// Finds the site by domain, creating and templating it when missing.
    /// Existing sites are only patched by the later steps.
    pub(super) fn resolve_site(&self, server: Id, conf: &SiteConfig) -> Result<Site> {
        let existing = self
            .api
            .list_sites(server)?
            .into_iter()
            .find(|s| s.name == conf.site_domain);

        if let Some(site) = existing {
            info!("site already exists");
            return Ok(site);
        }

        let template = self.resolve_nginx_template(server, &conf.nginx_template)?;

        info!("creating site...");
        let site = self.api.create_site(
            server,
            &CreateSite {
                domain: conf.site_domain.clone(),
                project_type: conf.project_type.clone(),
                aliases: conf.aliases.clone(),
                directory: conf.web_directory(),
                isolated: false,
                nginx_template: template,
            },
        )?;
        self.await_ready("site creation", Retries::default(), || {
            poll::site_installed(self.api, server, site.id)
        })?;
        info!("site created successfully");

        self.apply_nginx_variables(server, site.id, &conf.nginx_template_variables)?;

        Ok(site)
    }

    /// The local template file wins over the server copy when both exist.
    fn resolve_nginx_template(&self, server: Id, name: &str) -> Result<Id> {
        let remote = self
            .api
            .list_nginx_templates(server)?
            .into_iter()
            .find(|t| t.name == name);
        let remote_content = match &remote {
            Some(t) => Some(self.api.get_nginx_template(server, t.id)?.content),
            None => None,
        };
        let local = self.workspace.nginx_template(name)?;

        let state = TemplateState::from(local.as_deref(), remote_content.as_deref());
        debug!("nginx template `{name}`: {state}");

        match (state, remote, local) {
            (TemplateState::OnlyLocalExists, _, Some(content)) => {
                info!("creating nginx template `{name}`...");
                let template = self.api.create_nginx_template(server, name, &content)?;
                info!("nginx template created successfully");
                Ok(template.id)
            }
            (TemplateState::Changed, Some(template), Some(content)) => {
                self.api.update_nginx_template(server, template.id, &content)?;
                info!("nginx template `{name}` updated successfully");
                Ok(template.id)
            }
            (_, Some(template), _) => Ok(template.id),
            _ => Err(Error::config(format!(
                "invalid nginx template name `{name}`: no local `{name}.conf` and no template on the server"
            ))),
        }
    }

    fn apply_nginx_variables(&self, server: Id, site: Id, variables: &Variables) -> Result<()> {
        let generated = self.api.get_nginx_config(server, site)?;
        let rendered = render_nginx_variables(&generated, variables)?;
        self.api.set_nginx_config(server, site, &rendered)?;
        debug!("nginx config variables applied");
        Ok(())
    }

    /// Aliases are compared as sets and replaced as a whole.
    pub(super) fn converge_aliases(&self, server: Id, site: &Site, conf: &SiteConfig) -> Result<()> {
        let current: HashSet<&str> = site.aliases.iter().map(String::as_str).collect();
        let declared: HashSet<&str> = conf.aliases.iter().map(String::as_str).collect();

        if current == declared {
            debug!("aliases already match");
            return Ok(());
        }

        self.api.update_site_aliases(server, site.id, &conf.aliases)?;
        info!("site aliases updated successfully");
        Ok(())
    }

    pub(super) fn apply_custom_nginx_config(&self, server: Id, site: Id, conf: &SiteConfig) -> Result<()> {
        let Some(path) = &conf.nginx_custom_config else {
            return Ok(());
        };

        let custom = self.workspace.read(path, "nginx config file")?;
        let live = self.api.get_nginx_config(server, site)?;

        if live == custom {
            debug!("nginx config already matches {}", path.display());
            return Ok(());
        }

        self.api.set_nginx_config(server, site, &custom)?;
        info!("nginx config updated");
        Ok(())
    }
}
