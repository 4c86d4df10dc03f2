use std::fmt::{Display, Formatter};
use thiserror::Error;

/// The four requests the gateway issues; used to label failures and log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Failures surfaced by [`crate::gateway::UserGateway`].
///
/// Status codes are not inspected: any non-2xx response is a transport failure
/// like a refused connection or an undecodable body.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base url '{0}' cannot carry a path")]
    UnsupportedBaseUrl(String),
    #[error("{op} request failed: {source}")]
    Transport {
        op: Operation,
        #[source]
        source: reqwest::Error,
    },
}

impl GatewayError {
    pub(crate) fn transport(op: Operation) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| GatewayError::Transport { op, source }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
