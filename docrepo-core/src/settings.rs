//! Connection settings used to open a database handle.

use serde::{Deserialize, Serialize};

/// Immutable pair of a connection string and a database name.
///
/// Neither value is validated here; the backend reports malformed connection
/// strings when it connects. Settings deserialize from any serde source, so
/// they can be embedded in an application's own configuration:
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct AppConfig {
///     database: ConnectionSettings,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(alias = "conn_string", alias = "uri")]
    connection_string: String,
    #[serde(alias = "database")]
    database_name: String,
}

impl ConnectionSettings {
    pub fn new(connection_string: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            database_name: database_name.into(),
        }
    }

    /// The connection string, in the URI form expected by the backend's client.
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }
}
