//! `KEY=value` blocks: the `SECRETS` variable, env files and inline site
//! environments all share this format.

use log::warn;
use std::collections::BTreeMap;

pub type EnvVars = BTreeMap<String, String>;

/// Parses `KEY=value` lines. Keys are uppercased; both sides are trimmed and
/// only the first `=` splits. Blank lines are skipped, malformed ones warned
/// about and skipped.
pub fn parse_env(block: &str) -> EnvVars {
    let mut vars = EnvVars::new();

    for line in block.trim().lines() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                vars.insert(key.trim().to_uppercase(), value.trim().to_owned());
            }
            None => warn!(
                "could not parse line `{line}`: each line needs a key and a value separated by '='"
            ),
        }
    }

    vars
}

/// Layers `overrides` on top of `base`; overriding keys win.
pub fn merge_env(base: EnvVars, overrides: EnvVars) -> EnvVars {
    base.into_iter().chain(overrides).collect()
}

/// One `KEY=value` line per entry, newline-joined, no trailing newline.
pub fn render_env(vars: &EnvVars) -> String {
    vars.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
