use super::{poll, Reconciler};
use crate::{
    config::{SiteConfig, DAEMON_USER},
    error::Result,
    forge::{CreateJob, ForgeApi, Frequency, Id, Site},
    wait::Retries,
};
use log::{debug, info};

/// Binary forge installs for a php version: `php82` and `8.2` both map to
/// `php8.2`; no version means the server default `php`.
pub(crate) fn php_binary(version: Option<&str>) -> String {
    let Some(version) = version else {
        return "php".to_owned();
    };
    let digits = version.trim_start_matches("php");
    if digits.contains('.') || digits.len() < 2 {
        return format!("php{digits}");
    }
    let (major, minor) = digits.split_at(1);
    format!("php{major}.{minor}")
}

pub(crate) fn scheduler_command(php_version: Option<&str>, site_dir: &str) -> String {
    format!("{} {site_dir}/artisan schedule:run", php_binary(php_version))
}

impl<A: ForgeApi> Reconciler<'_, A> {
    /// Installs the declared php version server-wide if needed, then assigns
    /// it to the site. Returns a fresh snapshot of the site.
    pub(super) fn converge_php(&self, server: Id, site: Id, conf: &SiteConfig) -> Result<Site> {
        let current = self.api.get_site(server, site)?;

        let Some(wanted) = conf.php_version.as_deref() else {
            return Ok(current);
        };
        if current.php_version.as_deref() == Some(wanted) {
            debug!("php version already {wanted}");
            return Ok(current);
        }

        let installed = self.api.list_php_versions(server)?;
        if !installed.iter().any(|php| php.version == wanted) {
            info!("installing php version {wanted}...");
            self.api.install_php_version(server, wanted)?;
        }
        self.await_ready("php installation", Retries::default(), || {
            poll::php_installed(self.api, server, wanted)
        })?;
        info!("php version {wanted} installed");

        self.api.set_site_php_version(server, site, wanted)?;
        info!("php version set to {wanted}");

        self.api.get_site(server, site)
    }

    /// Presence of the `schedule:run` job follows the `laravel_scheduler` flag.
    pub(super) fn converge_scheduler(&self, server: Id, site: &Site, conf: &SiteConfig) -> Result<()> {
        if conf.project_type != "php" {
            return Ok(());
        }

        let command = scheduler_command(site.php_version.as_deref(), &conf.site_dir());
        let jobs = self.api.list_jobs(server)?;
        let current = jobs.iter().find(|job| job.command == command);

        match (conf.laravel_scheduler, current) {
            (true, None) => {
                self.api.create_job(
                    server,
                    &CreateJob {
                        command,
                        user: DAEMON_USER.to_owned(),
                        frequency: Frequency::Minutely,
                    },
                )?;
                info!("scheduler job created successfully");
            }
            (false, Some(job)) => {
                self.api.delete_job(server, job.id)?;
                info!("scheduler job deleted successfully");
            }
            _ => debug!("scheduler job already matches"),
        }

        Ok(())
    }
}
