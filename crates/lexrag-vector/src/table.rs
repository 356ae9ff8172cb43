//! LanceDB connection and table helpers.

use anyhow::Result;
use arrow_array::RecordBatchIterator;
use arrow_schema::SchemaRef;
use lancedb::{connect, Connection, Table};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

/// Open `name`, creating it empty with `schema` when missing.
pub async fn ensure_table(conn: &Connection, name: &str, schema: SchemaRef) -> Result<Table> {
    let names = conn.table_names().execute().await?;
    if names.contains(&name.to_string()) {
        return Ok(conn.open_table(name).execute().await?);
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    Ok(conn.create_table(name, Box::new(iter)).execute().await?)
}
