pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod interest;
pub mod pawn;
pub mod record;
pub mod schema;
pub mod types;

#[cfg(test)]
mod testutil;
