mod config;
mod error;
mod loader;
mod normalize;
mod row_source;
mod session;
mod sql_generator;
mod utils;

pub use config::{Cli, Config, ConnectionConfig, LoadOptions, SslMode};
pub use error::{DriverError, ErrorKind, LoadError};
pub use loader::{LoadSummary, load};
pub use normalize::{check_identifier, is_reserved_word, normalize_identifier, normalize_value};
pub use row_source::{NormalizeLineEndings, Row, RowSource};
pub use session::{PgSession, Session};
pub use sql_generator::{TablePlan, build_create, build_drop, build_drop_if_exists, build_insert};

/// Loads `config.input` into a new table: read the header, plan the table,
/// connect, then create and fill it.
pub fn run(config: &Config) -> Result<LoadSummary, LoadError> {
    let rows = RowSource::open(&config.input, config.load.delimiter)?;
    let plan = TablePlan::new(&config.input, rows.headers())?;
    let mut session = PgSession::connect(&config.connection)?;
    load(&mut session, rows, &plan, &config.load)
}
