//! Structural validation of the deployment document before it is turned
//! into typed configuration. Every violation is collected.

use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Bool,
    StringList,
    DaemonList,
    /// Text block, or the deprecated list of lines.
    Commands,
    /// Text block, or the older `KEY: value` mapping.
    Environment,
    ScalarMap,
    SiteList,
}

impl Kind {
    fn describe(self) -> &'static str {
        match self {
            Kind::String => "a string",
            Kind::Bool => "a boolean",
            Kind::StringList => "a list of strings",
            Kind::DaemonList => "a list of `command` mappings",
            Kind::Commands => "a text block",
            Kind::Environment => "a text block of KEY=value lines",
            Kind::ScalarMap => "a mapping of scalar values",
            Kind::SiteList => "a list of site mappings",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Bool => value.is_bool(),
            Kind::StringList => is_string_list(value),
            Kind::DaemonList => value.as_sequence().map_or(false, |items| {
                items.iter().all(|item| {
                    item.as_mapping().map_or(false, |m| {
                        m.get("command").map_or(false, Value::is_string) && m.len() == 1
                    })
                })
            }),
            Kind::Commands => value.is_string() || is_string_list(value),
            Kind::Environment => value.is_string() || is_scalar_map(value),
            Kind::ScalarMap => is_scalar_map(value),
            Kind::SiteList => value.is_sequence(),
        }
    }
}

struct Field {
    name: &'static str,
    kind: Kind,
    required: bool,
}

const fn field(name: &'static str, kind: Kind, required: bool) -> Field {
    Field {
        name,
        kind,
        required,
    }
}

const DEPLOYMENT_FIELDS: &[Field] = &[
    field("server_name", Kind::String, true),
    field("github_repository", Kind::String, true),
    field("github_branch", Kind::String, false),
    field("sites", Kind::SiteList, false),
];

const SITE_FIELDS: &[Field] = &[
    field("site_domain", Kind::String, true),
    field("root_dir", Kind::String, false),
    field("web_dir", Kind::String, false),
    field("project_type", Kind::String, false),
    field("php_version", Kind::String, false),
    field("github_branch", Kind::String, false),
    field("deployment_commands", Kind::Commands, false),
    field("daemons", Kind::DaemonList, false),
    field("laravel_scheduler", Kind::Bool, false),
    field("environment", Kind::Environment, false),
    field("env_file", Kind::String, false),
    field("aliases", Kind::StringList, false),
    field("nginx_template", Kind::String, false),
    field("nginx_template_variables", Kind::ScalarMap, false),
    field("nginx_config_variables", Kind::ScalarMap, false),
    field("nginx_custom_config", Kind::String, false),
    field("certificate", Kind::Bool, false),
    field("clone_repository", Kind::Bool, false),
];

fn is_string_list(value: &Value) -> bool {
    value
        .as_sequence()
        .map_or(false, |items| items.iter().all(Value::is_string))
}

fn is_scalar_map(value: &Value) -> bool {
    value.as_mapping().map_or(false, |m| {
        m.iter().all(|(k, v)| {
            k.is_string() && (v.is_string() || v.is_number() || v.is_bool())
        })
    })
}

/// Returns one message per violation, each prefixed with the field path.
pub fn validate(doc: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    let Some(root) = doc.as_mapping() else {
        violations.push("document: must be a mapping".to_owned());
        return violations;
    };

    check_fields(root, DEPLOYMENT_FIELDS, "", &mut violations);

    if let Some(Value::Sequence(items)) = root.get("sites") {
        let mut domains = HashSet::new();
        for (i, item) in items.iter().enumerate() {
            let prefix = format!("sites[{i}].");
            let Some(site) = item.as_mapping() else {
                violations.push(format!("sites[{i}]: must be a mapping"));
                continue;
            };
            check_fields(site, SITE_FIELDS, &prefix, &mut violations);

            if let Some(domain) = site.get("site_domain").and_then(Value::as_str) {
                if !domains.insert(domain) {
                    violations.push(format!(
                        "{prefix}site_domain: `{domain}` is declared more than once"
                    ));
                }
            }
        }
    }

    violations
}

fn check_fields(map: &Mapping, fields: &[Field], prefix: &str, violations: &mut Vec<String>) {
    for f in fields {
        match map.get(f.name) {
            None | Some(Value::Null) if f.required => {
                violations.push(format!("{prefix}{}: required field is missing", f.name));
            }
            None => {}
            Some(value) if !f.kind.accepts(value) => {
                violations.push(format!("{prefix}{}: must be {}", f.name, f.kind.describe()));
            }
            Some(_) => {}
        }
    }

    for key in map.keys() {
        let known = key
            .as_str()
            .map_or(false, |k| fields.iter().any(|f| f.name == k));
        if !known {
            let name = key.as_str().map_or_else(|| format!("{key:?}"), str::to_owned);
            violations.push(format!("{prefix}{name}: unknown field"));
        }
    }
}
