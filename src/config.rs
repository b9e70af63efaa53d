//! Runtime configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3030";
pub const DEFAULT_POOL_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid PAWNLEDGER_ADDR '{0}': expected host:port")]
	InvalidAddr(String),
	#[error("invalid PAWNLEDGER_POOL_SIZE '{0}': expected a positive integer")]
	InvalidPoolSize(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	/// PostgreSQL url; records are kept in memory when unset
	pub database_url: Option<String>,
	pub addr: SocketAddr,
	pub pool_size: u32,
}

impl Config {
	pub fn from_env() -> Result<Config, ConfigError> {
		dotenv::dotenv().ok();
		Config::from_lookup(|key| env::var(key).ok())
	}

	/// Build from an arbitrary variable source
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
		let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

		let addr = lookup("PAWNLEDGER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
		let addr = addr.parse().map_err(|_| ConfigError::InvalidAddr(addr.clone()))?;

		let pool_size = match lookup("PAWNLEDGER_POOL_SIZE") {
			Some(v) => match v.parse::<u32>() {
				Ok(n) if n > 0 => n,
				_ => return Err(ConfigError::InvalidPoolSize(v)),
			},
			None => DEFAULT_POOL_SIZE,
		};

		Ok(Config {
			database_url,
			addr,
			pool_size,
		})
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
		let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		Config::from_lookup(|k| vars.get(k).cloned())
	}

	#[test]
	fn defaults() {
		let c = from(&[]).unwrap();
		assert_eq!(c.database_url, None);
		assert_eq!(c.addr, DEFAULT_ADDR.parse().unwrap());
		assert_eq!(c.pool_size, DEFAULT_POOL_SIZE);
	}

	#[test]
	fn reads_values() {
		let c = from(&[
			("DATABASE_URL", "postgres://localhost/pawn"),
			("PAWNLEDGER_ADDR", "0.0.0.0:8080"),
			("PAWNLEDGER_POOL_SIZE", "4"),
		]).unwrap();
		assert_eq!(c.database_url.as_deref(), Some("postgres://localhost/pawn"));
		assert_eq!(c.addr.port(), 8080);
		assert_eq!(c.pool_size, 4);
	}

	#[test]
	fn rejects_bad_values() {
		assert!(matches!(from(&[("PAWNLEDGER_ADDR", "nowhere")]), Err(ConfigError::InvalidAddr(_))));
		assert!(matches!(from(&[("PAWNLEDGER_POOL_SIZE", "0")]), Err(ConfigError::InvalidPoolSize(_))));
		assert!(matches!(from(&[("PAWNLEDGER_POOL_SIZE", "ten")]), Err(ConfigError::InvalidPoolSize(_))));
	}

	#[test]
	fn blank_database_url_means_memory() {
		assert_eq!(from(&[("DATABASE_URL", "  ")]).unwrap().database_url, None);
	}
}
