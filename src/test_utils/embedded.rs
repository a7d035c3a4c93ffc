use postgresql_embedded::PostgreSQL;
use tracing::debug;

use crate::error::SqlExecError;

/// A throwaway `PostgreSQL` server for tests that have no external database.
pub struct EmbeddedPostgres {
    postgresql: PostgreSQL,
    database_url: String,
}

impl std::fmt::Debug for EmbeddedPostgres {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedPostgres")
            .field("database_url", &self.database_url)
            .finish_non_exhaustive()
    }
}

impl EmbeddedPostgres {
    /// Install the bundled binaries, start a server and create `database`.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConnectionUnavailable` when the server cannot be set up, started
    /// or provisioned.
    pub async fn start(database: &str) -> Result<Self, SqlExecError> {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await.map_err(unavailable)?;
        postgresql.start().await.map_err(unavailable)?;
        postgresql
            .create_database(database)
            .await
            .map_err(unavailable)?;

        let settings = postgresql.settings();
        let database_url = format!(
            "postgres://{}:{}@{}:{}/{database}",
            settings.username, settings.password, settings.host, settings.port
        );
        debug!(port = settings.port, database, "embedded postgres started");
        Ok(Self {
            postgresql,
            database_url,
        })
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub async fn stop(self) {
        if let Err(e) = self.postgresql.stop().await {
            debug!(error = %e, "embedded postgres did not stop cleanly");
        }
    }
}

fn unavailable(e: postgresql_embedded::Error) -> SqlExecError {
    SqlExecError::ConnectionUnavailable(format!("embedded postgres: {e}"))
}
