//! Row access and the mapping of driver rows into caller types.

use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};

use crate::driver::ResultStream;
use crate::error::SqlExecError;

mod projection;
mod row;

pub use projection::{FactoryExpression, Projection};
pub use row::{ColumnMetadata, RowMetadata, ValueRow};

/// Flatten every row of every driver result through `projection`, preserving driver order.
pub(crate) fn project_results<T: Send + 'static>(
    results: ResultStream,
    projection: Arc<Projection<T>>,
) -> BoxStream<'static, Result<T, SqlExecError>> {
    results
        .map_ok(move |result| {
            let projection = Arc::clone(&projection);
            result
                .rows()
                .map(move |row| row.and_then(|row| projection.project(row.as_ref())))
        })
        .try_flatten()
        .boxed()
}
