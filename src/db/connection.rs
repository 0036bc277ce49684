//! Connection provider - turns connection parameters into a destination

use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::{ConnectionParams, Driver};
use crate::db::destination::Destination;
use crate::db::postgres::PostgresDestination;
use crate::db::sqlite::SqliteDestination;
use crate::error::{LoadError, Result};

/// Open a destination for the given parameters.
///
/// Returns `Ok(None)` without touching the network when a required parameter
/// is missing. An unknown driver is [`LoadError::UnsupportedDriver`]; an
/// unreachable or refusing server is [`LoadError::Connection`]. Nothing is
/// retried.
pub async fn connect(params: &ConnectionParams) -> Result<Option<Box<dyn Destination>>> {
    let missing = params.missing();
    if !missing.is_empty() {
        warn!(missing = %missing.join(", "), "Connection parameters incomplete");
        return Ok(None);
    }

    let driver = Driver::from_str(params.driver().unwrap_or_default())?;
    info!(url = %params.display_url(), "Connecting to database");

    match driver {
        Driver::Postgres => {
            let options = postgres_options(params)?;
            let destination = PostgresDestination::connect(options)
                .await
                .map_err(|e| LoadError::Connection(e.to_string()))?;
            Ok(Some(Box::new(destination)))
        }
        Driver::Sqlite => {
            let database = params.database.as_deref().unwrap_or_default().trim();
            let destination = SqliteDestination::open(database)
                .map_err(|e| LoadError::Connection(e.to_string()))?;
            Ok(Some(Box::new(destination)))
        }
    }
}

/// Build PostgreSQL options; the schema becomes the session `search_path`
pub fn postgres_options(params: &ConnectionParams) -> Result<PgConnectOptions> {
    let field = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();

    let mut options = PgConnectOptions::new()
        .host(&field(&params.host))
        .port(params.port()?)
        .username(&field(&params.user))
        .password(&field(&params.password))
        .database(&field(&params.database));

    if let Some(schema) = params.schema() {
        options = options.options([("search_path", schema)]);
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_parameter_yields_none() {
        let mut params = ConnectionParams::from_env();
        params.driver = Some("postgresql".to_string());
        params.host = Some(String::new());
        let connection = connect(&params).await.unwrap();
        assert!(connection.is_none());
    }

    #[tokio::test]
    async fn test_unknown_driver_is_rejected() {
        let mut params = ConnectionParams::sqlite(":memory:");
        params.driver = Some("mysql+pymysql".to_string());
        let err = connect(&params).await.err().unwrap();
        assert!(matches!(err, LoadError::UnsupportedDriver(ref d) if d == "mysql+pymysql"));
    }

    #[tokio::test]
    async fn test_sqlite_connects() {
        let connection = connect(&ConnectionParams::sqlite(":memory:")).await.unwrap();
        assert!(connection.is_some());
        connection.unwrap().close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unopenable_sqlite_path_is_connection_error() {
        let dir = std::env::temp_dir().join(format!("yelp_loader_missing_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("db.sqlite");
        let err = connect(&ConnectionParams::sqlite(path.to_string_lossy()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Connection(_)));
    }

    #[test]
    fn test_invalid_port_is_configuration_error() {
        let mut params = ConnectionParams::from_env();
        params.port = Some("not-a-port".to_string());
        assert!(matches!(postgres_options(&params), Err(LoadError::Configuration(_))));
    }
}
