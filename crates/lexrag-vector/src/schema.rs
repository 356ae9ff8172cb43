use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub const TABLE_NAME: &str = "chunks";
pub const POSITION_COL: &str = "position";
pub const VECTOR_COL: &str = "vector";

/// `position` links a row to line `position` of `meta.jsonl`.
pub fn build_vector_schema(dim: usize) -> SchemaRef {
	Arc::new(Schema::new(vec![
		Field::new(POSITION_COL, DataType::Int64, false),
		Field::new(VECTOR_COL, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
	]))
}

/// Dimensionality declared by the `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COL).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}
