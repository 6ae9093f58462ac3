use anyhow::{Context, Result};
use log::LevelFilter;
use simple_logger::SimpleLogger;

pub fn level(verbosity: u8, quiet: bool, debug: bool) -> LevelFilter {
    match (verbosity, quiet) {
        (_, true) => LevelFilter::Error,
        (0, false) if debug => LevelFilter::Debug,
        (0, false) => LevelFilter::Info,
        (1, false) => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbosity: u8, quiet: bool, debug: bool) -> Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Error)
        .with_module_level("forge_deploy", level(verbosity, quiet, debug))
        .init()
        .context("cannot set logger")
}
