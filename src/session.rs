use postgres::Client;
use postgres::config::SslMode as PgSslMode;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, SslMode};
use crate::error::LoadError;

/// The database operations a load needs.
///
/// Statements are complete SQL text; implementations run them one at a time and
/// report failures as [`LoadError::Statement`]. Transaction control is expressed as
/// statements so an implementation only has to provide [`Session::execute`].
pub trait Session {
    fn execute(&mut self, statement: &str) -> Result<(), LoadError>;

    fn begin(&mut self) -> Result<(), LoadError> {
        self.execute("BEGIN")
    }

    fn commit(&mut self) -> Result<(), LoadError> {
        self.execute("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), LoadError> {
        self.execute("ROLLBACK")
    }
}

/// A blocking PostgreSQL connection.
pub struct PgSession {
    client: Client,
}

impl PgSession {
    pub fn connect(config: &ConnectionConfig) -> Result<Self, LoadError> {
        let target = config.target();

        let mut pg = postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .user(&config.user)
            .application_name(env!("CARGO_PKG_NAME"))
            .options(&format!("-c search_path={}", config.schema))
            .ssl_mode(match config.ssl_mode {
                SslMode::Disable => PgSslMode::Disable,
                SslMode::Prefer => PgSslMode::Prefer,
                SslMode::Require => PgSslMode::Require,
            });
        if !config.password.is_empty() {
            pg.password(&config.password);
        }
        if let Some(database) = &config.database {
            pg.dbname(database);
        }

        debug!(?config, "connecting");

        #[cfg(feature = "tls")]
        let connected = {
            let connector = native_tls::TlsConnector::new().map_err(|source| LoadError::Connection {
                target: target.clone(),
                source: source.into(),
            })?;
            pg.connect(postgres_native_tls::MakeTlsConnector::new(connector))
        };
        #[cfg(not(feature = "tls"))]
        let connected = pg.connect(postgres::NoTls);

        let client = connected.map_err(|source| LoadError::Connection {
            target: target.clone(),
            source: source.into(),
        })?;

        info!(%target, "connected");
        Ok(Self { client })
    }
}

impl Session for PgSession {
    fn execute(&mut self, statement: &str) -> Result<(), LoadError> {
        debug!(%statement, "execute");
        self.client
            .batch_execute(statement)
            .map_err(|source| LoadError::statement(statement, source))
    }
}
