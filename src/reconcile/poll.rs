//! Readiness checks for the provider's asynchronous operations. Each one is
//! a single read call; the caller decides how often to repeat it.

use crate::{
    error::Result,
    forge::{ForgeApi, Id},
};

pub fn site_installed(api: &impl ForgeApi, server: Id, site: Id) -> Result<bool> {
    Ok(api.get_site(server, site)?.is_installed())
}

pub fn repository_installed(api: &impl ForgeApi, server: Id, site: Id) -> Result<bool> {
    Ok(api.get_site(server, site)?.is_repository_installed())
}

/// A version missing from the list has not started installing yet.
pub fn php_installed(api: &impl ForgeApi, server: Id, version: &str) -> Result<bool> {
    Ok(api
        .list_php_versions(server)?
        .iter()
        .any(|php| php.version == version && php.is_installed()))
}

pub fn certificate_installed(api: &impl ForgeApi, server: Id, site: Id, certificate: Id) -> Result<bool> {
    Ok(api.get_certificate(server, site, certificate)?.is_installed())
}

pub fn deployment_finished(api: &impl ForgeApi, server: Id, site: Id) -> Result<bool> {
    Ok(!api.get_site(server, site)?.is_deploying())
}
