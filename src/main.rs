mod logger;
mod option;

use anyhow::{Context, Result};
use clap::Parser;
use forge_deploy::{
    config::load_config, forge::ForgeClient, reconcile::Reconciler, secrets::Secrets,
    workspace::Workspace,
};
use log::{error, info};
use option::Options;
use std::process::ExitCode;

fn main() -> ExitCode {
    let opts = Options::parse();

    if let Err(err) = logger::init(opts.verbosity, opts.quiet, opts.debug) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Options) -> Result<()> {
    let secrets = Secrets::parse(opts.secrets.as_deref());
    let workspace = Workspace::new(&opts.workspace, &opts.templates)?;

    let config_path = workspace.resolve(&opts.config);
    let config = load_config(&config_path, &secrets)
        .with_context(|| format!("cannot load {}", config_path.display()))?;

    let client = ForgeClient::new(&opts.api_url, &opts.token)?;
    Reconciler::new(&client, &workspace, &secrets)?
        .run(&config)
        .context("deployment aborted")?;

    info!("all {} site(s) deployed", config.sites.len());
    Ok(())
}
