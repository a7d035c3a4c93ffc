// PostgreSQL driver adapter
//
// - connection: the `Connection`/`Statement`/`DriverResult` implementations over tokio-postgres
// - params: `ToSql` for bound values
// - query: row extraction and column type mapping

mod connection;
pub mod params;
pub mod query;

pub use connection::PostgresConnection;
pub use query::{pg_sql_type, postgres_extract_value};
