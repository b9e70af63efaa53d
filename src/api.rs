//! HTTP surface of the ledger.
//!
//! Store calls block, so every handler hands its work to
//! `tokio::task::spawn_blocking`.

use std::convert::Infallible;
use std::sync::Arc;

use log::*;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::db;
use crate::pawn::{self, ErrorKind, RecordInput, Service, SettleInput};
use crate::record::{RecordChanges, RecordFilter};
use crate::types::{Date, Id};

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// All routes, with rejections turned into JSON error bodies
pub fn routes(service: Arc<Service>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
	let health = warp::path!("health")
		.and(warp::get())
		.map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

	let list = warp::path!("records")
		.and(warp::get())
		.and(warp::query::<RecordFilter>())
		.and(with_service(service.clone()))
		.and_then(list_records);

	let create = warp::path!("records")
		.and(warp::post())
		.and(json_body::<RecordInput>())
		.and(with_service(service.clone()))
		.and_then(create_record);

	let get = warp::path!("records" / Id)
		.and(warp::get())
		.and(with_service(service.clone()))
		.and_then(get_record);

	let update = warp::path!("records" / Id)
		.and(warp::patch())
		.and(json_body::<RecordChanges>())
		.and(with_service(service.clone()))
		.and_then(update_record);

	let quote = warp::path!("records" / Id / "quote")
		.and(warp::get())
		.and(warp::query::<QuoteQuery>())
		.and(with_service(service.clone()))
		.and_then(quote_record);

	let settle = warp::path!("records" / Id / "return")
		.and(warp::post())
		.and(json_body::<SettleInput>())
		.and(with_service(service.clone()))
		.and_then(settle_record);

	let dashboard = warp::path!("dashboard")
		.and(warp::get())
		.and(with_service(service))
		.and_then(get_dashboard);

	health
		.or(list)
		.or(create)
		.or(get)
		.or(update)
		.or(quote)
		.or(settle)
		.or(dashboard)
		.recover(handle_rejection)
}

#[derive(Debug, Deserialize)]
struct QuoteQuery {
	as_of: Option<Date>,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
	pub code: String,
	pub message: String,
}

#[derive(Debug)]
struct ApiError(pawn::Error);

impl warp::reject::Reject for ApiError {}

#[derive(Debug)]
struct TaskFailed;

impl warp::reject::Reject for TaskFailed {}

fn with_service(service: Arc<Service>) -> impl Filter<Extract = (Arc<Service>,), Error = Infallible> + Clone {
	warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
	T: serde::de::DeserializeOwned + Send,
{
	warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Run a service call on the blocking pool
async fn blocking<T, F>(service: Arc<Service>, f: F) -> Result<T, Rejection>
where
	T: Send + 'static,
	F: FnOnce(&Service) -> pawn::Result<T> + Send + 'static,
{
	tokio::task::spawn_blocking(move || f(&service))
		.await
		.map_err(|e| {
			error!("blocking task failed: {}", e);
			warp::reject::custom(TaskFailed)
		})?
		.map_err(|e| warp::reject::custom(ApiError(e)))
}

async fn list_records(filter: RecordFilter, service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let records = blocking(service, move |s| s.list_records(&filter)).await?;
	Ok(warp::reply::json(&records))
}

async fn create_record(input: RecordInput, service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let record = blocking(service, move |s| s.create_record(input)).await?;
	Ok(warp::reply::with_status(warp::reply::json(&record), StatusCode::CREATED))
}

async fn get_record(id: Id, service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let record = blocking(service, move |s| s.get_record(&id)).await?;
	Ok(warp::reply::json(&record))
}

async fn update_record(id: Id, changes: RecordChanges, service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let record = blocking(service, move |s| s.update_record(&id, changes)).await?;
	Ok(warp::reply::json(&record))
}

async fn quote_record(id: Id, q: QuoteQuery, service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let quote = blocking(service, move |s| s.quote(&id, q.as_of)).await?;
	Ok(warp::reply::json(&quote))
}

async fn settle_record(id: Id, input: SettleInput, service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let record = blocking(service, move |s| s.settle(&id, input)).await?;
	Ok(warp::reply::json(&record))
}

async fn get_dashboard(service: Arc<Service>) -> Result<impl Reply, Rejection> {
	let dashboard = blocking(service, |s| s.dashboard()).await?;
	Ok(warp::reply::json(&dashboard))
}

fn classify(e: &pawn::Error) -> (StatusCode, &'static str) {
	match e.kind() {
		ErrorKind::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
		ErrorKind::InvalidDate(_) => (StatusCode::BAD_REQUEST, "invalid_date"),
		ErrorKind::MissingField(_) => (StatusCode::BAD_REQUEST, "missing_field"),
		ErrorKind::MissingReturnedAmount => (StatusCode::BAD_REQUEST, "missing_returned_amount"),
		ErrorKind::AlreadySettled => (StatusCode::CONFLICT, "already_settled"),
		ErrorKind::Database(db::Error::RecordNotFound) => (StatusCode::NOT_FOUND, "record_not_found"),
		ErrorKind::Database(db::Error::RecordAlreadyExists) => (StatusCode::CONFLICT, "record_already_exists"),
		ErrorKind::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
	}
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
	let (status, code, message) = if let Some(ApiError(e)) = err.find::<ApiError>() {
		let (status, code) = classify(e);
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			error!("{}", e);
			(status, code, "internal error".to_string())
		} else {
			(status, code, e.to_string())
		}
	} else if err.is_not_found() {
		(StatusCode::NOT_FOUND, "not_found", "no such route".to_string())
	} else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
		(StatusCode::BAD_REQUEST, "invalid_body", e.to_string())
	} else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
		(StatusCode::BAD_REQUEST, "invalid_query", e.to_string())
	} else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
		(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "request body too large".to_string())
	} else if err.find::<warp::reject::LengthRequired>().is_some() {
		(StatusCode::LENGTH_REQUIRED, "length_required", "content-length header required".to_string())
	} else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
		(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "method not allowed".to_string())
	} else {
		if err.find::<TaskFailed>().is_none() {
			error!("unhandled rejection: {:?}", err);
		}
		(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error".to_string())
	};

	let body = ErrorBody {
		code: code.to_string(),
		message,
	};
	Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
