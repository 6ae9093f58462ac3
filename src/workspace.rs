use crate::{
    config::{expand_path, read_optional},
    error::{Error, Result},
};
use log::trace;
use std::path::{Path, PathBuf};

/// Where local files referenced by the deployment file live.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    templates: PathBuf,
}

impl Workspace {
    pub fn new(root: &Path, templates: &Path) -> Result<Self> {
        Ok(Workspace {
            root: expand_path(root)?,
            templates: expand_path(templates)?,
        })
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Reads a file the configuration refers to; a missing file is an error.
    pub fn read(&self, path: &Path, what: &str) -> Result<String> {
        let resolved = self.resolve(path);
        trace!("reading {what} from {resolved:?}");
        read_optional(&resolved)?.ok_or_else(|| {
            Error::config(format!("{what} `{}` doesn't exist", path.display()))
        })
    }

    /// Local copy of the named nginx template, if there is one.
    pub fn nginx_template(&self, name: &str) -> Result<Option<String>> {
        let path = self.templates.join(format!("{name}.conf"));
        trace!("looking for nginx template at {path:?}");
        read_optional(&path)
    }
}
