use super::{poll, Reconciler};
use crate::{
    config::SiteConfig,
    error::Result,
    forge::{Certificate, ForgeApi, Id},
    wait::Retries,
};
use log::{debug, info};
use std::collections::HashSet;

/// The certificate covering exactly `domains`, in any order. Overlap is not
/// enough.
pub(crate) fn find_certificate<'a>(certificates: &'a [Certificate], domains: &[String]) -> Option<&'a Certificate> {
    let wanted: HashSet<&str> = domains.iter().map(String::as_str).collect();
    certificates
        .iter()
        .find(|cert| cert.domains().collect::<HashSet<_>>() == wanted)
}

impl<A: ForgeApi> Reconciler<'_, A> {
    /// Issued, then installed, then active: each condition is checked on its
    /// own so a half-finished earlier run is picked up where it stopped.
    pub(super) fn converge_certificate(&self, server: Id, site: Id, conf: &SiteConfig) -> Result<()> {
        if !conf.certificate {
            return Ok(());
        }

        let domains = conf.domains();
        let existing = self.api.list_certificates(server, site)?;

        let mut certificate = match find_certificate(&existing, &domains) {
            Some(cert) => {
                debug!("certificate {} already covers {}", cert.id, cert.domain);
                cert.clone()
            }
            None => {
                info!("installing certificate...");
                self.api.create_letsencrypt_certificate(server, site, &domains)?
            }
        };

        if !certificate.is_installed() {
            let id = certificate.id;
            self.await_ready("applying certificate", Retries::default(), || {
                poll::certificate_installed(self.api, server, site, id)
            })?;
            certificate = self.api.get_certificate(server, site, id)?;
            info!("certificate added successfully");
        }

        if !certificate.active {
            self.api.activate_certificate(server, site, certificate.id)?;
            info!("certificate activated successfully");
        }

        Ok(())
    }
}
