use diesel::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel::result::DatabaseErrorKind::UniqueViolation;
use diesel::result::Error::{DatabaseError, NotFound};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool to the underlying PostgreSQL database
///
/// Fails when the first connection cannot be opened.
pub fn pg_pool(database_url: &str, max_size: u32) -> Result<PgPool> {
	let manager = ConnectionManager::<PgConnection>::new(database_url);
	r2d2::Pool::builder()
		.max_size(max_size)
		.build(manager)
		.map_err(Into::into)
}

/// Error that can occur when querying against the database
#[derive(Debug, Error)]
pub enum Error {
	#[error("record violates a unique constraint")]
	RecordAlreadyExists,
	#[error("record does not exist")]
	RecordNotFound,
	#[error("opening database connection: {0}")]
	Connection(String),
	/// Used as a catch-all for everything diesel reports that we don't map
	#[error("database error: {0}")]
	DatabaseError(diesel::result::Error),
}

impl From<diesel::result::Error> for Error {
	fn from(e: diesel::result::Error) -> Self {
		match e {
			DatabaseError(UniqueViolation, _) => Error::RecordAlreadyExists,
			NotFound => Error::RecordNotFound,

			_ => Error::DatabaseError(e),
		}
	}
}

impl From<r2d2::Error> for Error {
	fn from(e: r2d2::Error) -> Self {
		Error::Connection(e.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_diesel_not_found() {
		assert!(matches!(Error::from(NotFound), Error::RecordNotFound));
		assert!(matches!(
			Error::from(diesel::result::Error::RollbackTransaction),
			Error::DatabaseError(_)
		));
	}

	#[test]
	#[ignore = "needs a PostgreSQL database at DATABASE_URL"]
	fn connection() {
		dotenv::dotenv().ok();
		let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
		let pool = pg_pool(&url, 1).expect("build pool");
		pool.get().expect("get a db connection");
	}
}
