use super::Reconciler;
use crate::{
    config::{DaemonSpec, SiteConfig, DAEMON_START_SECS, DAEMON_USER},
    error::Result,
    forge::{CreateDaemon, Daemon, ForgeApi, Id},
};
use log::{debug, info};

/// What has to happen to a site's daemons, matched by command within the
/// site directory.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DaemonPlan<'a> {
    pub keep: Vec<&'a Daemon>,
    pub delete: Vec<&'a Daemon>,
    pub create: Vec<&'a DaemonSpec>,
}

pub(crate) fn plan_daemons<'a>(existing: &'a [Daemon], declared: &'a [DaemonSpec], site_dir: &str) -> DaemonPlan<'a> {
    let (keep, delete) = existing
        .iter()
        .filter(|d| d.directory.as_deref() == Some(site_dir))
        .partition::<Vec<_>, _>(|d| declared.iter().any(|spec| spec.command == d.command));

    let create = declared
        .iter()
        .filter(|spec| !keep.iter().any(|d| d.command == spec.command))
        .collect();

    DaemonPlan {
        keep,
        delete,
        create,
    }
}

impl<A: ForgeApi> Reconciler<'_, A> {
    /// Returns the ids of the site's daemons after convergence, kept ones
    /// first.
    pub(super) fn converge_daemons(&self, server: Id, conf: &SiteConfig) -> Result<Vec<Id>> {
        let site_dir = conf.site_dir();
        let existing = self.api.list_daemons(server)?;
        let plan = plan_daemons(&existing, &conf.daemons, &site_dir);
        debug!(
            "daemons: {} kept, {} to delete, {} to create",
            plan.keep.len(),
            plan.delete.len(),
            plan.create.len()
        );

        for daemon in &plan.delete {
            self.api.delete_daemon(server, daemon.id)?;
            info!("daemon-{} `{}` deleted", daemon.id, daemon.command);
        }

        let mut ids: Vec<Id> = plan.keep.iter().map(|d| d.id).collect();
        // a command declared twice only gets one daemon
        let mut created: Vec<&str> = Vec::new();
        for spec in plan.create {
            if created.contains(&spec.command.as_str()) {
                continue;
            }
            let daemon = self.api.create_daemon(
                server,
                &CreateDaemon {
                    command: spec.command.clone(),
                    user: DAEMON_USER.to_owned(),
                    directory: site_dir.clone(),
                    startsecs: DAEMON_START_SECS,
                },
            )?;
            info!("daemon-{} `{}` created", daemon.id, daemon.command);
            created.push(&spec.command);
            ids.push(daemon.id);
        }

        Ok(ids)
    }
}
