use std::fmt;

use sha2::{Digest, Sha256};

/// Physical resource id of a provisioned statement.
///
/// Hex SHA-256 of database, query and secret reference concatenated in that
/// order, so re-deploying an unchanged triple keeps the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    pub fn derive(database: &str, sql_query: &str, secret_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(database.as_bytes());
        hasher.update(sql_query.as_bytes());
        hasher.update(secret_id.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ResourceIdentity> for String {
    fn from(identity: ResourceIdentity) -> Self {
        identity.0
    }
}
