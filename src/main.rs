//! Placard Extractor - HTTP front end for the credential extraction engine.

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use placard_extractor::config::{ConfigStore, KeywordConfig};
use placard_extractor::{CredentialExtractor, ExtractionRecord, TextFragment};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How many served extractions stay available for lookup.
const MAX_STORED_EXTRACTIONS: usize = 256;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    extractions: Arc<RwLock<RecentExtractions>>,
    profiles: Arc<ConfigStore>,
}

impl AppState {
    fn new(profiles: ConfigStore) -> Self {
        Self {
            extractions: Arc::new(RwLock::new(RecentExtractions::default())),
            profiles: Arc::new(profiles),
        }
    }
}

/// Bounded in-memory record store; the oldest record is evicted first.
#[derive(Debug, Default)]
struct RecentExtractions {
    order: VecDeque<String>,
    records: HashMap<String, ExtractionRecord>,
}

impl RecentExtractions {
    fn insert(&mut self, record: ExtractionRecord) {
        if self.order.len() >= MAX_STORED_EXTRACTIONS {
            if let Some(oldest) = self.order.pop_front() {
                self.records.remove(&oldest);
            }
        }
        self.order.push_back(record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    fn get(&self, id: &str) -> Option<&ExtractionRecord> {
        self.records.get(id)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "placard_extractor=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load keyword profiles from filesystem
    let profiles_dir =
        std::env::var("PLACARD_PROFILES_DIR").unwrap_or_else(|_| "configs".to_string());
    let profiles = ConfigStore::load_from_dir(std::path::Path::new(&profiles_dir))?;
    info!("Loaded {} profiles: {:?}", profiles.list().len(), profiles.list());

    let app = build_router(AppState::new(profiles));

    let bind_addr =
        std::env::var("PLACARD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/profiles", get(list_profiles))
        .route("/profiles/:name", get(get_profile))
        .route("/extract", post(extract))
        .route("/extractions/:id", get(get_extraction))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List available keyword profiles.
async fn list_profiles(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.profiles.list())
}

/// Get a specific keyword profile.
async fn get_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<KeywordConfig>, StatusCode> {
    state
        .profiles
        .get(&name)
        .map(|p| Json(p.config.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Coordinate origin of the caller's boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Origin {
    #[default]
    BottomLeft,
    TopLeft,
}

#[derive(Deserialize)]
struct ExtractQuery {
    profile: Option<String>,
    #[serde(default)]
    origin: Origin,
}

#[derive(Deserialize)]
struct ExtractRequest {
    fragments: Vec<TextFragment>,
}

/// Run the engine over one image's OCR fragments.
async fn extract(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractionRecord>, (StatusCode, String)> {
    let profile = match query.profile.as_deref() {
        None => state.profiles.default_profile(),
        Some(name) => state.profiles.get(name).cloned().ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!(
                    "Unknown profile: {}. Available: {:?}",
                    name,
                    state.profiles.list()
                ),
            )
        })?,
    };

    let extractor = CredentialExtractor::new(Arc::clone(&profile.compiled));
    let result = match query.origin {
        Origin::BottomLeft => extractor.extract(&request.fragments),
        Origin::TopLeft => {
            let flipped: Vec<TextFragment> = request
                .fragments
                .iter()
                .map(|f| TextFragment::new(f.text.clone(), f.bbox.flipped_vertically()))
                .collect();
            extractor.extract(&flipped).flipped_vertically()
        }
    };

    let record = ExtractionRecord::new(&profile.config.name, &request.fragments, result);
    info!(
        "Extraction {} ({} fragments, profile={}): complete={} ssid={} password={}",
        record.id,
        record.fragment_count,
        record.profile,
        record.result.is_complete(),
        record.result.ssid.is_some(),
        record.result.password.is_some()
    );

    state
        .extractions
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(record.clone());

    Ok(Json(record))
}

/// Get a stored extraction by ID.
async fn get_extraction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExtractionRecord>, StatusCode> {
    let extractions = state
        .extractions
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    extractions
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
