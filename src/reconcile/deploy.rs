use super::{poll, Reconciler};
use crate::{
    config::{DeploymentConfig, SiteConfig},
    env::{merge_env, parse_env, render_env, EnvVars},
    error::{Error, Result},
    forge::{ForgeApi, Id, InstallRepository, Site},
    template::DeploymentScript,
    wait::Retries,
};
use log::{debug, info};

impl<A: ForgeApi> Reconciler<'_, A> {
    /// Attaches the deployment repository unless the site already tracks it.
    pub(super) fn attach_repository(
        &self,
        server: Id,
        site: &Site,
        config: &DeploymentConfig,
        conf: &SiteConfig,
    ) -> Result<()> {
        if !conf.clone_repository {
            return Ok(());
        }
        if site.repository.as_deref() == Some(config.github_repository.as_str()) {
            debug!("repository {} already attached", config.github_repository);
            return Ok(());
        }

        let branch = conf.branch(config);
        info!("adding repository {}@{branch}...", config.github_repository);
        self.api.install_repository(
            server,
            site.id,
            &InstallRepository {
                provider: "github".to_owned(),
                repository: config.github_repository.clone(),
                branch: branch.to_owned(),
                composer: false,
            },
        )?;
        self.await_ready("adding repository", Retries::default(), || {
            poll::repository_installed(self.api, server, site.id)
        })?;
        info!("repository added successfully");
        Ok(())
    }

    /// Without `deployment_commands` the provider's script is left alone.
    pub(super) fn push_deployment_script(&self, server: Id, site: Id, conf: &SiteConfig, daemon_ids: &[Id]) -> Result<()> {
        let Some(commands) = conf.deployment_commands.as_deref() else {
            return Ok(());
        };

        let site_dir = conf.site_dir();
        let script = DeploymentScript {
            site_dir: &site_dir,
            commands,
            daemon_ids,
        }
        .render(&self.handlebars)?;

        if self.api.get_deployment_script(server, site)? == script {
            debug!("deployment script already up to date");
            return Ok(());
        }

        // forge sources the env file from the site root, which breaks when
        // the code lives in a subdirectory
        self.api.update_deployment_script(server, site, &script, false)?;
        info!("deployment script added successfully");
        Ok(())
    }

    /// File variables first, inline ones on top.
    pub(super) fn push_environment(&self, server: Id, site: Id, conf: &SiteConfig) -> Result<()> {
        let from_file = match &conf.env_file {
            Some(path) => {
                info!("loading environment variables from file `{}`", path.display());
                let content = self.workspace.read(path, "environment file")?;
                let vars = parse_env(&self.secrets.substitute_str(&content)?);
                debug!("keys loaded from file: {:?}", vars.keys().collect::<Vec<_>>());
                vars
            }
            None => EnvVars::new(),
        };

        let env = render_env(&merge_env(from_file, conf.environment.clone()));
        if env.is_empty() {
            return Ok(());
        }

        if self.api.get_env(server, site)? == env {
            debug!("environment already up to date");
            return Ok(());
        }

        self.api.update_env(server, site, &env)?;
        info!("environment variables set successfully");
        Ok(())
    }

    /// Triggers a deployment and waits for it however long the build takes.
    /// A failed deployment aborts the run.
    pub(super) fn deploy(&self, server: Id, site: Id, conf: &SiteConfig) -> Result<()> {
        if !conf.clone_repository {
            return Ok(());
        }

        info!("deploying site...");
        self.api.deploy(server, site)?;
        self.await_ready("deploying site", Retries::Unlimited, || {
            poll::deployment_finished(self.api, server, site)
        })?;

        match self.api.deployment_log(server, site) {
            Ok(log) => info!("deployment log:\n{log}"),
            Err(e) if e.is_not_found() => debug!("no deployment log available"),
            Err(e) => return Err(e),
        }

        let deployments = self.api.list_deployments(server, site)?;
        if deployments.first().map_or(false, |d| d.is_failed()) {
            return Err(Error::DeploymentFailed(conf.site_domain.clone()));
        }

        info!("site deployed successfully");
        Ok(())
    }
}
