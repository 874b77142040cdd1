//! `SQLite` schema definitions for the document store.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the documents table.
///
/// Documents are grouped by logical database and collection; `body` holds
/// the JSON document as inserted.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    database TEXT NOT NULL,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (database, collection, id)
)
";

/// SQL statement to create an index on creation time for ordered reads.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_created_at
    ON documents(database, collection, created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_documents_table_keyed_by_collection_and_id() {
        assert!(CREATE_DOCUMENTS_TABLE.contains("PRIMARY KEY (database, collection, id)"));
        assert!(CREATE_DOCUMENTS_TABLE.contains("body TEXT NOT NULL"));
    }
}
