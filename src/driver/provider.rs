use std::sync::Arc;

use async_trait::async_trait;

use super::{Connection, ConnectionProvider};
use crate::error::SqlExecError;

/// Provider that always lends the same connection, typically the one holding the caller's
/// transaction.
#[derive(Clone)]
pub struct FixedConnectionProvider {
    connection: Arc<dyn Connection>,
}

impl FixedConnectionProvider {
    #[must_use]
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Wrap the provider for sharing between queries and clauses.
    #[must_use]
    pub fn shared(connection: Arc<dyn Connection>) -> Arc<dyn ConnectionProvider> {
        Arc::new(Self::new(connection))
    }
}

impl std::fmt::Debug for FixedConnectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FixedConnectionProvider")
            .field(&"<Connection>")
            .finish()
    }
}

#[async_trait]
impl ConnectionProvider for FixedConnectionProvider {
    async fn connection(&self) -> Result<Arc<dyn Connection>, SqlExecError> {
        Ok(Arc::clone(&self.connection))
    }
}
