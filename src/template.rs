use crate::{
    config::Variables,
    error::{Error, Result},
    forge::Id,
    handlebars::DEPLOYMENT_SCRIPT,
};
use handlebars::Handlebars;
use regex::{Captures, Regex};
use serde::Serialize;
use std::{fmt::Display, sync::OnceLock};

fn nginx_token() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("nginx token pattern"))
}

/// Replaces every `{{ name }}` token in a generated nginx config.
pub fn render_nginx_variables(config: &str, variables: &Variables) -> Result<String> {
    let mut undefined = None;
    let rendered = nginx_token().replace_all(config, |caps: &Captures<'_>| {
        let name = caps[1].trim();
        match variables.get(name) {
            Some(value) => value.clone(),
            None => {
                undefined.get_or_insert_with(|| name.to_owned());
                String::new()
            }
        }
    });

    match undefined {
        Some(name) => Err(Error::UndefinedVariable(name)),
        None => Ok(rendered.into_owned()),
    }
}

#[derive(Debug, Serialize)]
pub struct DeploymentScript<'a> {
    pub site_dir: &'a str,
    pub commands: &'a str,
    pub daemon_ids: &'a [Id],
}

impl DeploymentScript<'_> {
    pub fn render(&self, handlebars: &Handlebars<'_>) -> Result<String> {
        let script = DeploymentScript {
            commands: self.commands.trim_end(),
            ..*self
        };
        handlebars
            .render(DEPLOYMENT_SCRIPT, &script)
            .map_err(|e| Error::config(format!("render deployment script: {e}")))
    }
}

/// Local nginx template file compared with the one stored on the server.
#[derive(Debug, PartialEq, Eq)]
pub enum TemplateState {
    Identical,
    OnlyLocalExists,
    OnlyRemoteExists,
    Changed,
    BothMissing,
}

impl TemplateState {
    pub fn from(local: Option<&str>, remote: Option<&str>) -> TemplateState {
        match (local, remote) {
            (Some(l), Some(r)) => {
                if l == r {
                    TemplateState::Identical
                } else {
                    TemplateState::Changed
                }
            }
            (Some(_), None) => TemplateState::OnlyLocalExists,
            (None, Some(_)) => TemplateState::OnlyRemoteExists,
            (None, None) => TemplateState::BothMissing,
        }
    }
}

impl Display for TemplateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            TemplateState::Identical => "local and server template contents are equal",
            TemplateState::OnlyLocalExists => "template is not on the server yet",
            TemplateState::OnlyRemoteExists => "template only exists on the server",
            TemplateState::Changed => "local template contents were changed",
            TemplateState::BothMissing => "template is neither local nor on the server",
        }
        .fmt(f)
    }
}
