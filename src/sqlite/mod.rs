// SQLite driver adapter
//
// - connection: the `Connection`/`Statement`/`DriverResult` implementations over rusqlite
// - params: conversion of bound values and declared column types
// - query: row extraction and result metadata

mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
pub use query::sqlite_extract_value;
