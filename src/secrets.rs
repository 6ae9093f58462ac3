//! `${{ secrets.NAME }}` placeholder substitution.

use crate::{
    env::{parse_env, EnvVars},
    error::{Error, Result},
};
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{\{\s*secrets\.(\w+)\s*\}\}").expect("secret placeholder pattern")
    })
}

/// Secret values keyed by uppercase name.
#[derive(Debug, Default, Clone)]
pub struct Secrets(EnvVars);

impl Secrets {
    /// Reads the newline-delimited `KEY=VALUE` block of the `SECRETS` variable.
    pub fn parse(block: Option<&str>) -> Self {
        Secrets(block.map(parse_env).unwrap_or_default())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_uppercase()).map(String::as_str)
    }

    /// Replaces every placeholder in `text`. Names match case-insensitively.
    pub fn substitute_str(&self, text: &str) -> Result<String> {
        let mut missing = None;
        let replaced = placeholder().replace_all(text, |caps: &Captures<'_>| {
            let name = caps[1].to_uppercase();
            match self.get(&name) {
                Some(value) => value.to_owned(),
                None => {
                    missing.get_or_insert(name);
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(Error::MissingSecret(name)),
            None => Ok(replaced.into_owned()),
        }
    }

    /// Walks mappings and sequences, substituting every string leaf.
    /// Other scalars are left untouched.
    pub fn substitute(&self, value: Value) -> Result<Value> {
        Ok(match value {
            Value::String(s) => Value::String(self.substitute_str(&s)?),
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| self.substitute(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| Ok((k, self.substitute(v)?)))
                    .collect::<Result<_>>()?,
            ),
            Value::Tagged(mut tagged) => {
                tagged.value = self.substitute(tagged.value)?;
                Value::Tagged(tagged)
            }
            other => other,
        })
    }
}
