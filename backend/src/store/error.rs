use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {0} with id {1}")]
    NotFound(&'static str, i64),

    #[error("database schema version {0} is newer than this build supports")]
    UnsupportedSchema(u32),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
