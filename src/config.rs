use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::LoadError;
use crate::normalize::check_identifier;

/// Load a delimited text file into a new PostgreSQL table named after the file.
#[derive(Parser, Debug)]
#[command(name = "csv2pg", version)]
pub struct Cli {
    /// Delimited text file to load; its header row defines the columns
    pub file: PathBuf,

    /// Echo generated statements and diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Drop an existing table of the same name before creating it
    #[arg(short, long)]
    pub force: bool,

    /// Field delimiter, a single ASCII character
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// PostgreSQL host
    #[arg(short = 'H', long, default_value = "localhost")]
    pub host: String,

    /// PostgreSQL port
    #[arg(short = 'P', long, default_value_t = 5432)]
    pub port: u16,

    /// PostgreSQL user
    #[arg(short = 'U', long, default_value = "postgres")]
    pub user: String,

    /// PostgreSQL password
    #[arg(short = 'W', long, env = "PGPASSWORD", default_value = "", hide_env_values = true)]
    pub passwd: String,

    /// PostgreSQL database (defaults to the user name)
    #[arg(short = 'B', long)]
    pub db: Option<String>,

    /// Schema the table is created in
    #[arg(short = 'S', long, default_value = "public")]
    pub schema: String,

    /// TLS negotiation mode
    #[arg(long, value_enum, default_value_t = SslMode::Disable)]
    pub sslmode: SslMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SslMode {
    Disable,
    Prefer,
    Require,
}

/// Everything a run needs, fixed once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub load: LoadOptions,
    pub connection: ConnectionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub verbose: bool,
    pub force: bool,
    pub delimiter: u8,
}

impl LoadOptions {
    /// Log filter used when `RUST_LOG` is not set; verbose echoes statements and diagnostics.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "warn,csv2pg=debug" } else { "warn" }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            force: false,
            delimiter: b',',
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub schema: String,
    pub ssl_mode: SslMode,
}

impl ConnectionConfig {
    /// `user@host:port/database`, for messages. Never includes the password.
    pub fn target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user,
            self.host,
            self.port,
            self.database.as_deref().unwrap_or(&self.user)
        )
    }
}

// hand-written so the password never reaches logs
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl Cli {
    pub fn into_config(self) -> Result<Config, LoadError> {
        check_identifier(&self.schema)
            .map_err(|reason| LoadError::InvalidConfig(format!("--schema: {reason}")))?;

        Ok(Config {
            input: self.file,
            load: LoadOptions {
                verbose: self.verbose,
                force: self.force,
                delimiter: self.delimiter,
            },
            connection: ConnectionConfig {
                host: self.host,
                port: self.port,
                user: self.user,
                password: self.passwd,
                database: self.db.filter(|db| !db.is_empty()),
                schema: self.schema,
                ssl_mode: self.sslmode,
            },
        })
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    let mut chars = raw.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err(format!("expected exactly one character, got {raw:?}"));
    };
    if !c.is_ascii() {
        return Err(format!("{c:?} is not an ASCII character"));
    }
    if matches!(c, '"' | '\r' | '\n') {
        return Err(format!("{c:?} cannot be used as a delimiter"));
    }
    Ok(c as u8)
}
