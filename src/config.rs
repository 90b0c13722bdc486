use std::{net::SocketAddr, time::Duration};

use clap::Parser;

/// Command line of the test server. Every flag can also come from the
/// environment.
#[derive(Debug, Parser)]
#[command(name = "firefly-testserver", version, about = "Deliberately vulnerable HTTP fixture for black box scanners")]
pub struct Args {
    /// Address to accept connections on.
    #[arg(long, env = "FIREFLY_LISTEN", default_value = "127.0.0.1:3456")]
    pub listen: SocketAddr,

    /// Runtime worker threads. Defaults to the number of physical cores.
    #[arg(long, env = "FIREFLY_WORKERS")]
    pub workers: Option<usize>,

    /// Largest accepted request head (request line and headers) in bytes.
    #[arg(long, env = "FIREFLY_MAX_HEAD_BYTES", default_value_t = 4096)]
    pub max_head_bytes: usize,

    /// Seconds a keep-alive connection may stay idle.
    #[arg(long, env = "FIREFLY_IDLE_TIMEOUT", default_value_t = 30)]
    pub idle_timeout: u64,

    /// tracing filter directives, e.g. `info` or `firefly_testserver=debug`.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("max head bytes must be at least 64, got {0}")]
    HeadLimitTooSmall(usize),
    #[error("idle timeout must be at least one second")]
    NoIdleTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen: SocketAddr,
    pub workers: usize,
    pub max_head_bytes: usize,
    pub idle_timeout: Duration,
    pub log_filter: String,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let workers = args.workers.unwrap_or_else(num_cpus::get_physical);
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if args.max_head_bytes < MIN_HEAD_BYTES {
            return Err(ConfigError::HeadLimitTooSmall(args.max_head_bytes));
        }
        if args.idle_timeout == 0 {
            return Err(ConfigError::NoIdleTimeout);
        }

        Ok(Config {
            listen: args.listen,
            workers,
            max_head_bytes: args.max_head_bytes,
            idle_timeout: Duration::from_secs(args.idle_timeout),
            log_filter: args.log,
        })
    }
}

const MIN_HEAD_BYTES: usize = 64;
