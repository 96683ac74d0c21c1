use std::net::{AddrParseError, SocketAddr};

use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "libtech", about = "LibTech - library database dashboard")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "libtech.toml")]
    pub config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// PostgreSQL connection string (overrides the [database] section)
    #[arg(long)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the dashboard API (default)
    Serve,
    /// List report categories and their reports
    Reports,
    /// Run one report and print the result
    Run {
        /// Report name or slug
        report: String,
        /// Report parameter, e.g. --param branch_id=LIBTECH01
        #[arg(short = 'P', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Print every row of a table listed under a category
    Table { category: String, table: String },
    /// List the Add Data forms and their fields
    Forms,
    /// Submit one Add Data form
    Submit {
        /// Form name or slug
        form: String,
        /// Field value, e.g. --field branchid=LIBTECH01
        #[arg(short, long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("missing key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection string; when set the discrete fields are ignored.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SecurityConfig {
    /// Symmetric key handed to pgp_sym_encrypt for stored passcodes.
    #[serde(default)]
    pub encryption_key: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// When true, all API endpoints (except /health and /metrics) require authentication.
    #[serde(default)]
    pub enabled: bool,

    /// Static API keys. Each key has a name (for audit) and a role.
    #[serde(default)]
    pub api_keys: Vec<ApiKeyEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiKeyEntry {
    pub name: String,
    pub key: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "reader".to_string()
}

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_dbname() -> String {
    "libtech".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            dbname: default_dbname(),
            user: default_db_user(),
            password: String::new(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Single-quotes a libpq keyword value when it needs it.
fn conn_value(value: &str) -> String {
    if !value.is_empty() && !value.contains(|c: char| c.is_whitespace() || c == '\'' || c == '\\') {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "host={} port={} dbname={} user={} password={} connect_timeout={}",
            conn_value(&self.host),
            self.port,
            conn_value(&self.dbname),
            conn_value(&self.user),
            conn_value(&self.password),
            self.connect_timeout_secs
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: default_server(),
            logging: default_logging(),
            database: DatabaseConfig::default(),
            security: SecurityConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // Secrets from the environment
        if let Ok(password) = std::env::var("LIBTECH_DB_PASSWORD") {
            config.database.password = password;
        }
        if let Ok(key) = std::env::var("LIBTECH_ENCRYPTION_KEY") {
            config.security.encryption_key = key;
        }
        if let Ok(url) = std::env::var("LIBTECH_DATABASE_URL") {
            config.database.url = Some(url);
        }

        // CLI overrides
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ref url) = cli.database_url {
            config.database.url = Some(url.clone());
        }

        config
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("libtech").chain(args.iter().copied()))
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(&cli(&["--config", "/nonexistent/libtech.toml"]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.port, 5432);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn file_values_and_cli_overrides_combine() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[database]
host = "db.internal"
dbname = "libtech_prod"
user = "staff"
password = "two words"

[auth]
enabled = true
api_keys = [{{ name = "desk", key = "k1", role = "writer" }}]
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::load(&cli(&["--config", &path, "--port", "9000"]));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.api_keys[0].role, "writer");
        assert_eq!(
            config.database.connection_string(),
            "host=db.internal port=5432 dbname=libtech_prod user=staff password='two words' connect_timeout=5"
        );
    }

    #[test]
    fn database_url_wins_over_discrete_fields() {
        let config = Config::load(&cli(&[
            "--config",
            "/nonexistent",
            "--database-url",
            "postgres://u@h/db",
        ]));
        assert_eq!(config.database.connection_string(), "postgres://u@h/db");
    }

    #[test]
    fn empty_password_is_quoted() {
        let db = DatabaseConfig::default();
        assert!(db.connection_string().contains("password=''"));
    }

    #[test]
    fn run_params_parse_as_pairs() {
        let args = cli(&["run", "calculate-total-inventory-value", "-P", "branch_id=LIBTECH01"]);
        assert_eq!(
            args.command,
            Some(Command::Run {
                report: "calculate-total-inventory-value".to_string(),
                params: vec![("branch_id".to_string(), "LIBTECH01".to_string())],
            })
        );
        assert!(CliArgs::try_parse_from(["libtech", "run", "x", "-P", "novalue"]).is_err());
    }

    #[test]
    fn listen_addr_parses() {
        assert_eq!(Config::default().listen_addr().unwrap().port(), 3000);
    }
}
