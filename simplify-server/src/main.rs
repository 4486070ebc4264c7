use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};

use simplify_core::config::Settings;
use simplify_core::memo::Memo;
use simplify_core::request::{RequestKey, CONTROLS};
use simplify_core::{SimplificationRequest, SimplifyError, Transformer};

/// Command line of the server. Flags override the config file.
#[derive(Parser, Debug)]
#[command(name = "simplify-server", version, about = "HTTP front-end for the text simplifier")]
struct Cli {
	/// TOML config file (defaults to $SIMPLIFY_CONFIG, then built-in defaults)
	#[arg(long)]
	config: Option<PathBuf>,

	#[arg(long)]
	host: Option<String>,

	#[arg(long)]
	port: Option<u16>,
}

/// Body of a successful `/v1/simplify` call.
#[derive(Serialize, Deserialize, Debug)]
struct SimplifyResponse {
	lines: Vec<String>,
	/// `true` when served from the memo cache.
	cached: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct ErrorBody {
	kind: String,
	message: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct ModelStatus {
	ready: bool,
	path: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct CacheStats {
	entries: usize,
	hits: u64,
	misses: u64,
}

struct SharedData {
	transformer: Transformer,
	cache: Mutex<Memo<RequestKey, Vec<String>>>,
}

impl SharedData {
	fn new(transformer: Transformer, cache_capacity: usize) -> Self {
		Self {
			transformer,
			cache: Mutex::new(Memo::bounded(cache_capacity)),
		}
	}

	fn model_status(&self) -> ModelStatus {
		let model = self.transformer.model();
		ModelStatus {
			ready: model.is_prepared(),
			path: model.dir().display().to_string(),
		}
	}
}

/// Maps an adapter error to its HTTP status with a JSON body.
fn error_response(e: &SimplifyError) -> HttpResponse {
	let body = ErrorBody {
		kind: e.kind().to_owned(),
		message: e.to_string(),
	};
	match e {
		SimplifyError::InvalidParameter { .. } => HttpResponse::BadRequest().json(body),
		SimplifyError::ModelUnavailable { .. } => HttpResponse::ServiceUnavailable().json(body),
		SimplifyError::PipelineExecution { .. } | SimplifyError::Artifact(_) => {
			HttpResponse::InternalServerError().json(body)
		}
	}
}

/// HTTP POST endpoint `/v1/simplify`
///
/// Simplifies the text of a JSON `SimplificationRequest`. Knobs left out
/// take their defaults. Identical requests are answered from the cache.
#[post("/v1/simplify")]
async fn post_simplify(data: web::Data<SharedData>, request: web::Json<SimplificationRequest>) -> impl Responder {
	let request = request.into_inner();
	if let Err(e) = request.validate() {
		return error_response(&e);
	}

	let key = request.key();
	{
		let mut cache = match data.cache.lock() {
			Ok(c) => c,
			Err(_) => return HttpResponse::InternalServerError().body("Cache lock failed"),
		};
		if let Some(lines) = cache.get(&key) {
			return HttpResponse::Ok().json(SimplifyResponse { lines: lines.clone(), cached: true });
		}
	}

	// The simplifier blocks for the whole decode. The transform mutes the
	// process-wide log level meanwhile, so access lines and errors of other
	// requests are dropped while any decode is in flight.
	let shared = data.clone();
	let result = web::block(move || shared.transformer.transform(&request)).await;

	match result {
		Ok(Ok(lines)) => {
			match data.cache.lock() {
				Ok(mut cache) => cache.insert(key, lines.clone()),
				Err(_) => error!("cache lock poisoned, result not memoised"),
			}
			HttpResponse::Ok().json(SimplifyResponse { lines, cached: false })
		}
		Ok(Err(e)) => {
			error!("simplification failed: {e}");
			error_response(&e)
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Simplification task failed: {e}")),
	}
}

/// HTTP GET endpoint `/v1/parameters`
///
/// Ranges, defaults and steps of the four knobs.
#[get("/v1/parameters")]
async fn get_parameters() -> impl Responder {
	HttpResponse::Ok().json(CONTROLS)
}

#[get("/v1/model")]
async fn get_model(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().json(data.model_status())
}

/// HTTP PUT endpoint `/v1/model`
///
/// Prepares the model now instead of on the first request. Idempotent.
#[put("/v1/model")]
async fn put_model(data: web::Data<SharedData>) -> impl Responder {
	let shared = data.clone();
	match web::block(move || shared.transformer.model().ensure_ready().map(Path::to_owned)).await {
		Ok(Ok(_)) => HttpResponse::Ok().json(data.model_status()),
		Ok(Err(e)) => {
			error!("model preparation failed: {e}");
			error_response(&e)
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Model preparation task failed: {e}")),
	}
}

#[get("/v1/cache")]
async fn get_cache(data: web::Data<SharedData>) -> impl Responder {
	let cache = match data.cache.lock() {
		Ok(c) => c,
		Err(_) => return HttpResponse::InternalServerError().body("Cache lock failed"),
	};
	let (hits, misses) = cache.stats();
	HttpResponse::Ok().json(CacheStats { entries: cache.len(), hits, misses })
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(post_simplify)
		.service(get_parameters)
		.service(get_model)
		.service(put_model)
		.service(get_cache);
}

/// Main entry point for the server.
///
/// Loads the settings, builds the transformation adapter, optionally
/// prepares the model, then serves the `/v1` endpoints.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	let mut settings = Settings::load(cli.config.as_deref()).map_err(io::Error::other)?;
	if let Some(host) = cli.host {
		settings.server.host = host;
	}
	if let Some(port) = cli.port {
		settings.server.port = port;
	}

	let shared = web::Data::new(SharedData::new(settings.transformer(), settings.server.cache_capacity));

	if settings.server.prepare_on_start {
		let warm = shared.clone();
		let dir = web::block(move || warm.transformer.model().ensure_ready().map(Path::to_owned))
			.await
			.map_err(io::Error::other)?
			.map_err(io::Error::other)?;
		info!("model ready at {}", dir.display());
	}

	let server = settings.server.clone();
	info!("listening on {}:{} with {} worker(s)", server.host, server.port, server.workers);

	HttpServer::new(move || {
		let cors = if server.cors_permissive { Cors::permissive() } else { Cors::default() };
		App::new()
			.wrap(Logger::default())
			.wrap(cors)
			.app_data(shared.clone())
			.configure(routes)
	})
		.workers(settings.server.workers.max(1))
		.bind((settings.server.host.as_str(), settings.server.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use simplify_core::io::{read_lines, write_lines};
	use simplify_core::model::{ModelArtifact, NoSource};
	use simplify_core::pipeline::{PipelineJob, SimplificationPipeline};
	use std::fs;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;
	use tempfile::TempDir;

	/// Reverses the words of every line.
	struct Reverse {
		calls: Arc<AtomicUsize>,
	}

	impl SimplificationPipeline for Reverse {
		fn run(&self, job: &PipelineJob<'_>) -> Result<(), SimplifyError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let lines = read_lines(job.source)?;
			let reversed = lines
				.iter()
				.map(|line| line.split(' ').rev().collect::<Vec<_>>().join(" "));
			write_lines(job.prediction, reversed)?;
			Ok(())
		}
	}

	/// Fails the decode, either outright or by losing the prediction file.
	enum Broken {
		Crash,
		LosePrediction,
	}

	impl SimplificationPipeline for Broken {
		fn run(&self, job: &PipelineJob<'_>) -> Result<(), SimplifyError> {
			match self {
				Self::Crash => Err(SimplifyError::PipelineExecution { message: "decoder crashed".to_owned() }),
				Self::LosePrediction => {
					fs::remove_file(job.prediction)?;
					Ok(())
				}
			}
		}
	}

	fn shared(model_ready: bool, calls: Arc<AtomicUsize>) -> (TempDir, web::Data<SharedData>) {
		shared_with(model_ready, Arc::new(Reverse { calls }))
	}

	fn shared_with(model_ready: bool, pipeline: Arc<dyn SimplificationPipeline>) -> (TempDir, web::Data<SharedData>) {
		let root = tempfile::tempdir().unwrap();
		let dir = root.path().join("model");
		if model_ready {
			fs::create_dir(&dir).unwrap();
			fs::write(dir.join("checkpoint_best.pt"), "weights").unwrap();
		}
		let model = Arc::new(ModelArtifact::new(dir, Box::new(NoSource)));
		let transformer = Transformer::new(model, pipeline);
		(root, web::Data::new(SharedData::new(transformer, 8)))
	}

	#[actix_web::test]
	async fn identical_requests_are_served_from_cache() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (_root, data) = shared(true, calls.clone());
		let app = test::init_service(App::new().app_data(data).configure(routes)).await;

		let body = SimplificationRequest::new("the cat sat\nit rained");
		let first: SimplifyResponse = test::call_and_read_body_json(
			&app,
			test::TestRequest::post().uri("/v1/simplify").set_json(&body).to_request(),
		)
		.await;
		let second: SimplifyResponse = test::call_and_read_body_json(
			&app,
			test::TestRequest::post().uri("/v1/simplify").set_json(&body).to_request(),
		)
		.await;

		assert_eq!(first.lines, ["sat cat the", "rained it"]);
		assert!(!first.cached);
		assert_eq!(second.lines, first.lines);
		assert!(second.cached);
		assert_eq!(calls.load(Ordering::SeqCst), 1);

		let stats: CacheStats =
			test::call_and_read_body_json(&app, test::TestRequest::get().uri("/v1/cache").to_request()).await;
		assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
	}

	#[actix_web::test]
	async fn out_of_range_vocab_size_is_a_bad_request() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (_root, data) = shared(true, calls.clone());
		let app = test::init_service(App::new().app_data(data).configure(routes)).await;

		let mut body = SimplificationRequest::new("text");
		body.vocab_size = 40000;
		let response =
			test::call_service(&app, test::TestRequest::post().uri("/v1/simplify").set_json(&body).to_request()).await;

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		let error: ErrorBody = test::read_body_json(response).await;
		assert_eq!(error.kind, "invalid_parameter");
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[actix_web::test]
	async fn missing_model_is_service_unavailable() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (_root, data) = shared(false, calls.clone());
		let app = test::init_service(App::new().app_data(data).configure(routes)).await;

		let status: ModelStatus =
			test::call_and_read_body_json(&app, test::TestRequest::get().uri("/v1/model").to_request()).await;
		assert!(!status.ready);

		let body = SimplificationRequest::new("text");
		let response =
			test::call_service(&app, test::TestRequest::post().uri("/v1/simplify").set_json(&body).to_request()).await;
		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

		let response = test::call_service(&app, test::TestRequest::put().uri("/v1/model").to_request()).await;
		assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
		let error: ErrorBody = test::read_body_json(response).await;
		assert_eq!(error.kind, "model_unavailable");
	}

	#[actix_web::test]
	async fn simplifier_failures_are_internal_errors() {
		for (pipeline, kind) in [(Broken::Crash, "pipeline_execution"), (Broken::LosePrediction, "artifact")] {
			let (_root, data) = shared_with(true, Arc::new(pipeline));
			let app = test::init_service(App::new().app_data(data).configure(routes)).await;

			let body = SimplificationRequest::new("text");
			let response =
				test::call_service(&app, test::TestRequest::post().uri("/v1/simplify").set_json(&body).to_request())
					.await;
			assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
			let error: ErrorBody = test::read_body_json(response).await;
			assert_eq!(error.kind, kind);

			// Failures are not memoised
			let stats: CacheStats =
				test::call_and_read_body_json(&app, test::TestRequest::get().uri("/v1/cache").to_request()).await;
			assert_eq!(stats.entries, 0);
		}
	}

	#[actix_web::test]
	async fn prepared_model_reports_ready() {
		let (_root, data) = shared(true, Arc::new(AtomicUsize::new(0)));
		let app = test::init_service(App::new().app_data(data).configure(routes)).await;

		let status: ModelStatus =
			test::call_and_read_body_json(&app, test::TestRequest::put().uri("/v1/model").to_request()).await;
		assert!(status.ready);
		assert!(status.path.ends_with("model"));
	}

	#[actix_web::test]
	async fn parameters_describe_the_four_controls() {
		let (_root, data) = shared(true, Arc::new(AtomicUsize::new(0)));
		let app = test::init_service(App::new().app_data(data).configure(routes)).await;

		let controls: Vec<serde_json::Value> =
			test::call_and_read_body_json(&app, test::TestRequest::get().uri("/v1/parameters").to_request()).await;

		let names: Vec<&str> = controls.iter().filter_map(|c| c["name"].as_str()).collect();
		assert_eq!(names, ["length_ratio", "levenshtein_ratio", "word_rank_ratio", "vocab_size"]);
		assert_eq!(controls[3]["default"], 10000.0);
	}
}
