use std::env;
use std::sync::Arc;

use log::*;
use warp::filters::log::Info;
use warp::Filter;

use pawnledger::config::Config;
use pawnledger::pawn::{NewService, Service};
use pawnledger::record::memory::MemoryStore;
use pawnledger::record::{Repo, Store};
use pawnledger::types::SystemCalendar;
use pawnledger::{api, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	if env::var_os("RUST_LOG").is_none() {
		env::set_var("RUST_LOG", "pawnledger=info");
	}
	pretty_env_logger::init();

	let config = Config::from_env()?;

	let store: Box<dyn Store> = match &config.database_url {
		Some(url) => {
			let pool = db::pg_pool(url, config.pool_size)?;
			info!("using PostgreSQL store (pool size {})", config.pool_size);
			Box::new(Repo::new(pool))
		}
		None => {
			warn!("DATABASE_URL is not set, records are kept in memory and lost on exit");
			Box::new(MemoryStore::new())
		}
	};

	let service = Arc::new(Service::new(NewService {
		store,
		calendar: Box::new(SystemCalendar),
	}));

	let log = warp::log::custom(|info: Info| {
		info!(
			target: "pawnledger::api",
			"\"{} {} {:?}\" \t{} {} {:?}",
			info.method(),
			info.path(),
			info.version(),
			info.status().canonical_reason().unwrap_or("-"),
			info.status().as_u16(),
			info.elapsed(),
		);
	});
	let routes = api::routes(service).with(log);

	info!("listening on {}", config.addr);
	warp::serve(routes).run(config.addr).await;
	Ok(())
}
