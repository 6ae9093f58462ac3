use crate::{
    env::{parse_env, EnvVars},
    error::{Error, Result},
    schema,
    secrets::Secrets,
};
use log::{debug, warn};
use serde::Deserialize;
use serde_yaml::Value;
use std::{
    collections::HashMap,
    fs::File,
    io::{ErrorKind, Read},
    path::{Component, Path, PathBuf},
};

pub type Variables = HashMap<String, String>;

/// Every forge site lives under this user's home directory.
pub const FORGE_HOME: &str = "/home/forge";
pub const DAEMON_USER: &str = "forge";
pub const DAEMON_START_SECS: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentConfig {
    pub server_name: String,
    pub github_repository: String,
    pub github_branch: String,
    pub sites: Vec<SiteConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub site_domain: String,
    pub root_dir: String,
    pub web_dir: String,
    pub project_type: String,
    pub php_version: Option<String>,
    pub github_branch: Option<String>,
    /// `None` keeps the provider's current deployment script.
    pub deployment_commands: Option<String>,
    pub daemons: Vec<DaemonSpec>,
    pub laravel_scheduler: bool,
    pub environment: EnvVars,
    pub env_file: Option<PathBuf>,
    pub aliases: Vec<String>,
    pub nginx_template: String,
    pub nginx_template_variables: Variables,
    pub nginx_custom_config: Option<PathBuf>,
    pub certificate: bool,
    pub clone_repository: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSpec {
    pub command: String,
}

impl SiteConfig {
    /// Directory the site's code is checked out to, e.g. `/home/forge/example.com/app`.
    pub fn site_dir(&self) -> String {
        join_normalized([FORGE_HOME, self.site_domain.as_str(), self.root_dir.as_str()])
    }

    /// Web directory relative to the site home, as sent on creation.
    pub fn web_directory(&self) -> String {
        join_normalized([self.root_dir.as_str(), self.web_dir.as_str()])
    }

    /// Declared domain plus aliases, the names a certificate has to cover.
    pub fn domains(&self) -> Vec<String> {
        std::iter::once(self.site_domain.clone())
            .chain(self.aliases.iter().cloned())
            .collect()
    }

    pub fn branch<'a>(&'a self, config: &'a DeploymentConfig) -> &'a str {
        self.github_branch
            .as_deref()
            .unwrap_or(&config.github_branch)
    }
}

/// Absolute paths are relative to the site root: `/public` becomes `./public`.
pub fn ensure_relative_path(path: &str) -> String {
    if path.starts_with('/') {
        format!(".{path}")
    } else {
        path.to_owned()
    }
}

fn join_normalized<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined: PathBuf = parts
        .into_iter()
        .flat_map(|p| Path::new(p).components())
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if joined.as_os_str().is_empty() {
        ".".to_owned()
    } else {
        joined.to_string_lossy().into_owned()
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    server_name: String,
    github_repository: String,
    #[serde(default = "default_branch")]
    github_branch: String,
    #[serde(default)]
    sites: Vec<RawSite>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSite {
    site_domain: String,
    #[serde(default = "default_root_dir")]
    root_dir: String,
    #[serde(default = "default_web_dir")]
    web_dir: String,
    #[serde(default = "default_project_type")]
    project_type: String,
    php_version: Option<String>,
    github_branch: Option<String>,
    deployment_commands: Option<Commands>,
    #[serde(default)]
    daemons: Vec<DaemonSpec>,
    #[serde(default)]
    laravel_scheduler: Option<bool>,
    environment: Option<Environment>,
    env_file: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default = "default_nginx_template")]
    nginx_template: String,
    #[serde(default, alias = "nginx_config_variables")]
    nginx_template_variables: HashMap<String, Value>,
    nginx_custom_config: Option<String>,
    #[serde(default)]
    certificate: bool,
    #[serde(default = "default_true")]
    clone_repository: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Commands {
    Block(String),
    Lines(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Environment {
    Block(String),
    Pairs(HashMap<String, Value>),
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_root_dir() -> String {
    ".".to_owned()
}

fn default_web_dir() -> String {
    "public".to_owned()
}

fn default_project_type() -> String {
    "html".to_owned()
}

fn default_nginx_template() -> String {
    "default".to_owned()
}

fn default_true() -> bool {
    true
}

/// Loads, substitutes secrets in, validates and normalizes the deployment file.
pub fn load_config(config_path: &Path, secrets: &Secrets) -> Result<DeploymentConfig> {
    let document: Value = load_file(config_path)?.ok_or_else(|| {
        Error::config(format!(
            "the configuration file {} is missing",
            config_path.display()
        ))
    })?;

    parse_config(document, secrets)
}

pub fn parse_config(document: Value, secrets: &Secrets) -> Result<DeploymentConfig> {
    let document = secrets.substitute(document)?;

    let violations = schema::validate(&document);
    if !violations.is_empty() {
        return Err(Error::Validation(violations));
    }

    let raw: RawConfig = serde_yaml::from_value(document)
        .map_err(|e| Error::config(format!("deserialize configuration: {e}")))?;

    let config = DeploymentConfig {
        server_name: raw.server_name,
        github_repository: raw.github_repository,
        github_branch: raw.github_branch,
        sites: raw.sites.into_iter().map(SiteConfig::from).collect(),
    };
    debug!(
        "loaded {} site(s) for server `{}`",
        config.sites.len(),
        config.server_name
    );

    Ok(config)
}

impl From<RawSite> for SiteConfig {
    fn from(raw: RawSite) -> Self {
        // a blank block keeps the provider's script, same as no block
        let deployment_commands = raw
            .deployment_commands
            .map(|c| match c {
                Commands::Block(block) => block,
                Commands::Lines(lines) => {
                    warn!(
                        "{}: a list of deployment commands is deprecated, use a text block",
                        raw.site_domain
                    );
                    lines.join("\n")
                }
            })
            .filter(|commands| !commands.trim().is_empty());

        let environment = match raw.environment {
            None => EnvVars::new(),
            Some(Environment::Block(block)) => parse_env(&block),
            Some(Environment::Pairs(pairs)) => pairs
                .into_iter()
                .map(|(k, v)| (k.trim().to_uppercase(), scalar_to_string(&v)))
                .collect(),
        };

        let nginx_template_variables = raw
            .nginx_template_variables
            .into_iter()
            .map(|(k, v)| (k, scalar_to_string(&v)))
            .collect();

        SiteConfig {
            root_dir: ensure_relative_path(&raw.root_dir),
            web_dir: ensure_relative_path(&raw.web_dir),
            project_type: raw.project_type,
            php_version: raw.php_version,
            github_branch: raw.github_branch,
            deployment_commands,
            daemons: raw.daemons,
            laravel_scheduler: raw.laravel_scheduler.unwrap_or(false),
            environment,
            env_file: raw.env_file.map(|p| PathBuf::from(ensure_relative_path(&p))),
            aliases: raw.aliases,
            nginx_template: raw.nginx_template,
            nginx_template_variables,
            nginx_custom_config: raw
                .nginx_custom_config
                .map(|p| PathBuf::from(ensure_relative_path(&p))),
            certificate: raw.certificate,
            clone_repository: raw.clone_repository,
            site_domain: raw.site_domain,
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

pub fn load_file(filename: &Path) -> Result<Option<Value>> {
    let Some(buf) = read_optional(filename)? else {
        return Ok(None);
    };
    let data = serde_yaml::from_str::<Value>(&buf).map_err(|e| {
        Error::config(format!("error parsing YAML file {}: {e}", filename.display()))
    })?;
    Ok(Some(data))
}

/// Reads a whole file, `None` when it doesn't exist.
pub fn read_optional(filename: &Path) -> Result<Option<String>> {
    let mut buf = String::new();
    let mut f = match File::open(filename) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::config(format!(
                "open file {}: {e}",
                filename.display()
            )))
        }
    };
    f.read_to_string(&mut buf)
        .map_err(|e| Error::config(format!("read file {}: {e}", filename.display())))?;
    Ok(Some(buf))
}

/// Expands `~` and `$VARS` in a user supplied path.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full(&path.to_string_lossy())
        .map_err(|e| Error::config(format!("expand path {}: {e}", path.display())))?
        .to_string();

    Ok(PathBuf::from(expanded))
}
