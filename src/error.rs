//! Error types for forge-deploy.

use reqwest::StatusCode;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unreadable file, malformed document, bad option.
    #[error("configuration error: {0}")]
    Config(String),

    /// Schema violations, all of them.
    #[error("configuration validation failed:\n  {}", .0.join("\n  "))]
    Validation(Vec<String>),

    /// A `${{ secrets.NAME }}` placeholder without a value.
    #[error("secret '{0}' value is not set")]
    MissingSecret(String),

    /// No server with the configured name is visible to the token.
    #[error("server `{0}` not found")]
    ServerNotFound(String),

    /// A provider-side operation did not reach its terminal status in time.
    #[error("{0} timed out")]
    ProvisioningTimeout(String),

    /// An nginx `{{ token }}` without a declared value.
    #[error("nginx variable '{0}' value is not set")]
    UndefinedVariable(String),

    /// Any failed call to the provider API.
    #[error("failed to {operation}")]
    RemoteApi {
        /// What the client was doing, e.g. `create site`.
        operation: String,
        /// Why it failed.
        #[source]
        cause: ApiFailure,
    },

    /// The most recent deployment of a site reported `failed`.
    #[error("deployment of `{0}` failed")]
    DeploymentFailed(String),

    /// Attaches the site being reconciled to the underlying failure.
    #[error("site `{domain}`")]
    Site {
        /// Domain of the site block.
        domain: String,
        /// The failure itself.
        #[source]
        source: Box<Error>,
    },
}

/// The underlying cause of a [`Error::RemoteApi`] failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiFailure {
    /// Connection, TLS or timeout problem.
    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a remote API error for the named operation.
    #[must_use]
    pub fn remote(operation: impl Into<String>, cause: impl Into<ApiFailure>) -> Self {
        Self::RemoteApi {
            operation: operation.into(),
            cause: cause.into(),
        }
    }

    /// Create a timeout error for the named operation.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::ProvisioningTimeout(operation.into())
    }

    /// Wrap this error with the domain of the site it happened in.
    #[must_use]
    pub fn in_site(self, domain: &str) -> Self {
        Self::Site {
            domain: domain.to_owned(),
            source: Box::new(self),
        }
    }

    /// The error underneath any [`Error::Site`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Site { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this is a provider `404 Not Found` answer.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Self::RemoteApi {
                cause: ApiFailure::Status { status, .. },
                ..
            } if *status == StatusCode::NOT_FOUND
        )
    }
}
