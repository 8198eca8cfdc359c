//! Database layer for terapie.

pub mod entities;
pub mod migrations;
pub mod provider;
pub mod repositories;
pub mod test_utils;

pub use provider::ProviderRef;

use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr,
    sea_query::{Expr, Func, SimpleExpr},
};
use std::time::Duration;
use terapie_common::{AppError, Config};
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Map an insert/update error, turning unique violations into `Conflict`.
pub(crate) fn write_err(err: DbErr, conflict: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Unique constraint violated");
            AppError::Conflict(conflict.to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// Case-insensitive substring match on a text column.
pub(crate) fn ilike<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(like_pattern(needle))
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Cluj"), "%cluj%");
        assert_eq!(like_pattern("50%_Off"), r"%50\%\_off%");
    }

    #[test]
    fn test_ilike_lowercases_column() {
        let sql = user::Entity::find()
            .filter(ilike(user::Column::Name, "ana"))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"LOWER("name") LIKE"#), "{sql}");
    }

    #[test]
    fn test_write_err_passes_through_other_errors() {
        let err = write_err(DbErr::Custom("boom".to_string()), "taken");
        assert!(matches!(err, AppError::Database(_)));
    }
}
