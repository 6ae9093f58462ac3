use clap::{
    builder::{FalseyValueParser, NonEmptyStringValueParser},
    Parser,
};
use std::path::PathBuf;

use forge_deploy::forge::DEFAULT_API_URL;

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Options {
    /// Deployment file, relative to the workspace.
    #[clap(short, long, env = "DEPLOYMENT_FILE", default_value = "forge-deploy.yml")]
    pub config: PathBuf,

    /// Checkout the deployment file and the files it references live in.
    #[clap(short, long, env = "GITHUB_WORKSPACE", default_value = "./")]
    pub workspace: PathBuf,

    /// Directory with local nginx templates, one `<name>.conf` each.
    #[clap(long, env = "NGINX_TEMPLATES_DIR", default_value = "nginx_templates")]
    pub templates: PathBuf,

    #[clap(long, env = "FORGE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[clap(long, env = "FORGE_API_TOKEN", hide_env_values = true, value_parser = NonEmptyStringValueParser::new())]
    pub token: String,

    /// `KEY=VALUE` lines available as `${{ secrets.KEY }}`.
    #[clap(long, env = "SECRETS", hide_env_values = true)]
    pub secrets: Option<String>,

    #[clap(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    #[clap(short, long, value_parser)]
    pub quiet: bool,

    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}
