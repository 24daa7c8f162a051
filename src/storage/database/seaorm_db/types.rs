use sea_orm::DatabaseConnection;

/// Warehouse handle
#[derive(Debug, Clone)]
pub struct SeaOrmDatabase {
    pub(super) db: DatabaseConnection,
    pub(super) backend_type: DatabaseBackendType,
}

/// Which SQL backend the warehouse URL selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    PostgreSQL,
    SQLite,
}

impl DatabaseBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseBackendType::PostgreSQL => "postgres",
            DatabaseBackendType::SQLite => "sqlite",
        }
    }
}
