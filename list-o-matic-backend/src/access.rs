use std::collections::HashSet;

use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt as _};
use http::request::Parts;
use list_o_matic_database::models::Visibility;
use sha2::{Digest as _, Sha256};
use tracing::debug;

/// What the core knows about whoever sent a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Privileged,
}

impl Caller {
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Privileged)
    }

    /// Whether a single list with `visibility` may be read.
    #[must_use]
    pub const fn can_read(self, visibility: Visibility) -> bool {
        match self {
            Self::Privileged => true,
            Self::Anonymous => !matches!(visibility, Visibility::Private),
        }
    }

    /// Whether a list with `visibility` shows up in the overview of all lists.
    #[must_use]
    pub const fn can_list(self, visibility: Visibility) -> bool {
        match self {
            Self::Privileged => true,
            Self::Anonymous => matches!(visibility, Visibility::Public),
        }
    }
}

pub trait AccessPolicy: Send + Sync {
    fn caller(&self, request: &Parts) -> Caller;
}

/// Grants privileges to requests carrying `Authorization: Bearer <key>` where the
/// SHA-256 digest of the key is configured.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyPolicy {
    admin_key_sha256: HashSet<String>,
}

impl ApiKeyPolicy {
    pub fn new<I, S>(admin_key_sha256: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_key_sha256: admin_key_sha256
                .into_iter()
                .map(|digest| digest.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    #[must_use]
    pub fn digest(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }
}

impl AccessPolicy for ApiKeyPolicy {
    fn caller(&self, request: &Parts) -> Caller {
        let Some(Authorization(bearer)) = request.headers.typed_get::<Authorization<Bearer>>()
        else {
            return Caller::Anonymous;
        };
        if self
            .admin_key_sha256
            .contains(&Self::digest(bearer.token()))
        {
            Caller::Privileged
        } else {
            debug!("rejected unknown api key");
            Caller::Anonymous
        }
    }
}

/// Treats every request the same. Useful for tests and trusted deployments.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Caller);

impl AccessPolicy for FixedPolicy {
    fn caller(&self, _request: &Parts) -> Caller {
        self.0
    }
}
