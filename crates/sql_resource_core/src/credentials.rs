//! Secret payload decoding and driver connection descriptors.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::ProvisionError;

/// Connect timeout embedded in every connection descriptor.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const REDACTED: &str = "***";

/// Database credentials decoded from a secret payload.
///
/// Extra fields in the payload (engine, instance identifiers) are ignored.
#[derive(Clone, Deserialize)]
pub struct CredentialSet {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

pub fn decode_credentials(payload: &str) -> Result<CredentialSet, ProvisionError> {
    serde_json::from_str(payload).map_err(ProvisionError::MalformedSecret)
}

/// Everything a driver needs to reach one database.
///
/// `Display` and `Debug` redact the password; only
/// [`ConnectionDescriptor::connection_string`] exposes it.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    database: String,
    username: String,
    password: Zeroizing<String>,
    connect_timeout: Duration,
}

impl ConnectionDescriptor {
    pub fn build(credentials: CredentialSet, database: &str) -> Self {
        Self {
            host: credentials.host,
            port: credentials.port,
            database: database.to_string(),
            username: credentials.username,
            password: credentials.password,
            connect_timeout: CONNECTION_TIMEOUT,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Connection string including the plaintext password. Never log it.
    ///
    /// The SQL Server driver is configured from the individual fields instead
    /// of this string, since its ADO parser has no `Port=` key.
    pub fn connection_string(&self) -> Zeroizing<String> {
        Zeroizing::new(self.render(&self.password))
    }

    pub fn redacted(&self) -> String {
        self.render(REDACTED)
    }

    fn render(&self, password: &str) -> String {
        format!(
            "Server={};Port={};Database={};User Id={};password={};Connection Timeout={}",
            self.host,
            self.port,
            self.database,
            self.username,
            password,
            self.connect_timeout.as_secs()
        )
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionDescriptor")
            .field(&self.redacted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str =
        "{\"host\": \"host\",\"username\": \"user\",\"password\": \"password\", \"port\":1344}";

    #[test]
    fn decodes_secret_payload() {
        let credentials = decode_credentials(PAYLOAD).expect("payload should decode");
        assert_eq!(credentials.host, "host");
        assert_eq!(credentials.port, 1344);
        assert_eq!(credentials.username, "user");
        assert_eq!(credentials.password.as_str(), "password");
    }

    #[test]
    fn ignores_unrelated_secret_fields() {
        let credentials = decode_credentials(
            r#"{"engine":"sqlserver","host":"h","port":1433,"username":"u","password":"p"}"#,
        )
        .expect("payload should decode");
        assert_eq!(credentials.port, 1433);
    }

    #[test]
    fn rejects_invalid_json_as_malformed() {
        let error = decode_credentials("Invalid Json").expect_err("payload should fail");
        assert!(matches!(error, ProvisionError::MalformedSecret(_)));
        assert!(error.to_string().contains("expected value"));
    }

    #[test]
    fn rejects_structural_mismatch_as_malformed() {
        let missing_password = decode_credentials(r#"{"host":"h","port":1,"username":"u"}"#)
            .expect_err("missing password should fail");
        assert!(matches!(missing_password, ProvisionError::MalformedSecret(_)));

        let string_port =
            decode_credentials(r#"{"host":"h","port":"1433","username":"u","password":"p"}"#)
                .expect_err("string port should fail");
        assert!(matches!(string_port, ProvisionError::MalformedSecret(_)));
    }

    #[test]
    fn builds_connection_string() {
        let credentials = decode_credentials(PAYLOAD).expect("payload should decode");
        let descriptor = ConnectionDescriptor::build(credentials, "db");

        assert_eq!(
            descriptor.connection_string().as_str(),
            "Server=host;Port=1344;Database=db;User Id=user;password=password;Connection Timeout=5"
        );
        assert_eq!(descriptor.connect_timeout(), CONNECTION_TIMEOUT);
    }

    #[test]
    fn redacts_password_in_display_and_debug() {
        let credentials = decode_credentials(PAYLOAD).expect("payload should decode");
        assert!(!format!("{credentials:?}").contains("password\""));
        assert!(format!("{credentials:?}").contains("***"));

        let descriptor = ConnectionDescriptor::build(credentials, "db");
        let shown = descriptor.to_string();
        assert!(shown.contains("password=***"));
        assert!(!shown.contains("password=password"));
        assert!(!format!("{descriptor:?}").contains("password=password"));
    }
}
