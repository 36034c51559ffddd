//! Utility functions for SQLite storage operations.

/// Upper bound on bound parameters per statement.
///
/// SQLite builds older than 3.32 cap statements at 999 variables
/// (SQLITE_MAX_VARIABLE_NUMBER); staying under it keeps batch inserts portable.
pub const SQLITE_MAX_PARAMS: usize = 999;

/// Rows per multi-row INSERT for a table with `columns` columns.
pub fn rows_per_statement(columns: usize) -> usize {
    (SQLITE_MAX_PARAMS / columns.max(1)).max(1)
}

/// Chunk a slice of rows so each multi-row INSERT stays under the parameter limit.
pub fn chunk_rows_for_sqlite<T>(rows: &[T], columns: usize) -> impl Iterator<Item = &[T]> {
    rows.chunks(rows_per_statement(columns))
}
