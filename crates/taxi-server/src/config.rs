use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use taxi_core::password::DEFAULT_ITERATIONS;
use taxi_core::StoreConfig;

#[derive(Debug, Parser)]
#[command(name = "taxi-server")]
#[command(about = "Taxi fleet service - manufacturers, cars and drivers")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Database directory (default: temporary database, discarded on exit)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Session timeout in minutes
    #[arg(long, default_value_t = 60)]
    pub session_timeout: u64,

    /// PBKDF2 rounds for new password hashes
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub password_iterations: u32,

    /// Staff account to create at startup if missing, as username:password
    #[arg(long, value_parser = parse_admin)]
    pub admin: Option<AdminAccount>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Bootstrap staff credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub username: String,
    pub password: String,
}

fn parse_admin(value: &str) -> Result<AdminAccount, String> {
    match value.split_once(':') {
        Some((username, password)) if !username.is_empty() && !password.is_empty() => {
            Ok(AdminAccount {
                username: username.to_string(),
                password: password.to_string(),
            })
        }
        _ => Err("expected username:password".to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub session_timeout: Duration,
    pub password_iterations: u32,
    pub admin: Option<AdminAccount>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_dir: None,
            session_timeout: Duration::from_secs(60 * 60),
            password_iterations: DEFAULT_ITERATIONS,
            admin: None,
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            data_dir: args.data_dir,
            session_timeout: Duration::from_secs(args.session_timeout.saturating_mul(60)),
            password_iterations: args.password_iterations,
            admin: args.admin,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Storage settings derived from the server flags.
    pub fn store_config(&self) -> StoreConfig {
        let config = match &self.data_dir {
            Some(dir) => StoreConfig::new(dir),
            None => StoreConfig::temporary(),
        };
        config.with_password_iterations(self.password_iterations)
    }
}
