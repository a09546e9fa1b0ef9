//! # Ops HTTP Front Door
//!
//! ## Endpoints
//! - GET /ops/v1/{overview,header,cluster,raft,replication,queue,proposals,
//!   durability,health,finality,tarmk,tar-chain}
//! - GET /ops/v1/events/recent?limit=N
//! - GET /ops/v1/events/stats
//! - GET /ops/v1/transactions/summary
//! - GET /ops/v1/transactions/{id} (id = sisa path mentah)
//! - GET /metrics - Prometheus metrics (di luar kontrak envelope)
//!
//! ## Front Door Rules
//! - OPTIONS → 204 tanpa body, hanya header CORS
//! - method selain GET → 405 `METHOD_NOT_ALLOWED`
//! - path tidak dikenal → 404 `NOT_FOUND`
//! - resolver gagal → 502 `UPSTREAM_UNAVAILABLE` (retryable)
//!
//! Semua response membawa header CORS dan `cache-control: no-store`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use serde::Serialize;
use tracing::{info, info_span, instrument, warn, Instrument};

use crate::canned;
use crate::config::{GatewayConfig, GatewayMode};
use crate::envelope::Envelope;
use crate::error::{GatewayError, UpstreamError};
use crate::metrics::{GatewayMetrics, RequestContext};
use crate::snapshot::{clamp_event_limit, SnapshotResolver};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const TRANSACTIONS_PREFIX: &str = "/ops/v1/transactions/";

// ════════════════════════════════════════════════════════════════════════════
// STATE
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub resolver: SnapshotResolver,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(config: GatewayConfig, resolver: SnapshotResolver) -> Self {
        let metrics = Arc::clone(resolver.upstream().metrics());
        Self {
            config: Arc::new(config),
            resolver,
            metrics,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ENDPOINTS
// ════════════════════════════════════════════════════════════════════════════

/// Satu endpoint dashboard. Dipakai bersama oleh jalur live dan static.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Overview,
    Header,
    Cluster,
    Raft,
    Replication,
    Queue,
    Proposals,
    Durability,
    Health,
    EventsRecent { limit: u32 },
    EventsStats,
    Finality,
    Tarmk,
    TarChain,
    TransactionsSummary,
    TransactionDetail(String),
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Overview => "overview",
            Endpoint::Header => "header",
            Endpoint::Cluster => "cluster",
            Endpoint::Raft => "raft",
            Endpoint::Replication => "replication",
            Endpoint::Queue => "queue",
            Endpoint::Proposals => "proposals",
            Endpoint::Durability => "durability",
            Endpoint::Health => "health",
            Endpoint::EventsRecent { .. } => "events_recent",
            Endpoint::EventsStats => "events_stats",
            Endpoint::Finality => "finality",
            Endpoint::Tarmk => "tarmk",
            Endpoint::TarChain => "tar_chain",
            Endpoint::TransactionsSummary => "transactions_summary",
            Endpoint::TransactionDetail(_) => "transaction_detail",
        }
    }
}

fn wrap<T: Serialize>(cluster_id: &str, data: T) -> Response {
    Envelope::new(cluster_id, data).into_response()
}

async fn resolve_live(
    resolver: &SnapshotResolver,
    endpoint: &Endpoint,
    cluster_id: &str,
) -> Result<Response, UpstreamError> {
    let response = match endpoint {
        Endpoint::Overview => wrap(cluster_id, resolver.overview().await?),
        Endpoint::Header => wrap(cluster_id, resolver.header().await?),
        Endpoint::Cluster => wrap(cluster_id, resolver.cluster().await?),
        Endpoint::Raft => wrap(cluster_id, resolver.raft().await?),
        Endpoint::Replication => wrap(cluster_id, resolver.replication().await?),
        Endpoint::Queue => wrap(cluster_id, resolver.queue().await?),
        Endpoint::Proposals => wrap(cluster_id, resolver.proposals().await?),
        Endpoint::Durability => wrap(cluster_id, resolver.durability().await?),
        Endpoint::Health => wrap(cluster_id, resolver.health().await?),
        Endpoint::EventsRecent { limit } => wrap(cluster_id, resolver.events_recent(*limit).await?),
        Endpoint::EventsStats => wrap(cluster_id, resolver.events_stats().await?),
        Endpoint::Finality => wrap(cluster_id, resolver.finality().await?),
        Endpoint::Tarmk => wrap(cluster_id, resolver.tarmk().await?),
        Endpoint::TarChain => wrap(cluster_id, resolver.tar_chain().await?),
        Endpoint::TransactionsSummary => wrap(cluster_id, resolver.transactions_summary().await?),
        Endpoint::TransactionDetail(id) => wrap(cluster_id, resolver.transaction_detail(id).await?),
    };
    Ok(response)
}

/// Serve satu endpoint sesuai mode gateway.
#[instrument(skip_all, fields(endpoint = endpoint.name()))]
async fn serve(state: AppState, endpoint: Endpoint) -> Response {
    let cluster_id = state.config.cluster_id.as_str();

    if state.config.mode == GatewayMode::Static {
        let data = canned::payload(&endpoint, state.resolver.chain_mode());
        return wrap(cluster_id, data);
    }

    match resolve_live(&state.resolver, &endpoint, cluster_id).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "snapshot resolve failed");
            GatewayError::from(e).into_response()
        }
    }
}

fn fixed(endpoint: Endpoint) -> MethodRouter<AppState> {
    get(move |State(state): State<AppState>| {
        let endpoint = endpoint.clone();
        async move { serve(state, endpoint).await }
    })
}

async fn events_recent(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = clamp_event_limit(params.get("limit").map(String::as_str));
    serve(state, Endpoint::EventsRecent { limit }).await
}

/// Id transaksi = sisa path mentah setelah prefix, tanpa percent-decode.
/// Boleh kosong dan boleh memuat `/`.
fn transaction_id(path: &str) -> Option<&str> {
    path.strip_prefix(TRANSACTIONS_PREFIX)
}


/// GET /metrics - Prometheus exposition format.
async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE))],
        state.metrics.to_prometheus(),
    )
        .into_response()
}

/// Route tanpa match. `/ops/v1/transactions/{id}` dilayani di sini agar id
/// mentah apa pun (termasuk yang tidak valid UTF-8 setelah decode) tetap
/// menghasilkan envelope.
async fn fallback(State(state): State<AppState>, uri: Uri) -> Response {
    match transaction_id(uri.path()) {
        Some(id) => serve(state, Endpoint::TransactionDetail(id.to_string())).await,
        None => GatewayError::NotFound.into_response(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MIDDLEWARE
// ════════════════════════════════════════════════════════════════════════════

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type,authorization"),
    );
}

/// Method gate, CORS, no-store, dan request metrics untuk semua route.
pub async fn front_door(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = if method == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else if method != Method::GET {
        GatewayError::MethodNotAllowed.into_response()
    } else {
        let span = info_span!("request", trace_id = %ctx.trace_id);
        next.run(req).instrument(span).await
    };

    let headers = response.headers_mut();
    apply_cors(headers);
    if method != Method::OPTIONS {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    if let Ok(value) = HeaderValue::from_str(ctx.trace_id.as_str()) {
        headers.insert(HeaderName::from_static("x-trace-id"), value);
    }

    let status = response.status().as_u16();
    let latency_ms = ctx.elapsed_ms();
    state.metrics.record_response(status, latency_ms);
    info!(
        trace_id = %ctx.trace_id,
        method = %method,
        path = %path,
        status,
        latency_ms,
        "request served"
    );

    response
}

// ════════════════════════════════════════════════════════════════════════════
// ROUTER
// ════════════════════════════════════════════════════════════════════════════

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ops/v1/overview", fixed(Endpoint::Overview))
        .route("/ops/v1/header", fixed(Endpoint::Header))
        .route("/ops/v1/cluster", fixed(Endpoint::Cluster))
        .route("/ops/v1/raft", fixed(Endpoint::Raft))
        .route("/ops/v1/replication", fixed(Endpoint::Replication))
        .route("/ops/v1/queue", fixed(Endpoint::Queue))
        .route("/ops/v1/proposals", fixed(Endpoint::Proposals))
        .route("/ops/v1/durability", fixed(Endpoint::Durability))
        .route("/ops/v1/health", fixed(Endpoint::Health))
        .route("/ops/v1/events/recent", get(events_recent))
        .route("/ops/v1/events/stats", fixed(Endpoint::EventsStats))
        .route("/ops/v1/finality", fixed(Endpoint::Finality))
        .route("/ops/v1/tarmk", fixed(Endpoint::Tarmk))
        .route("/ops/v1/tar-chain", fixed(Endpoint::TarChain))
        .route("/ops/v1/transactions/summary", fixed(Endpoint::TransactionsSummary))
        .route("/metrics", get(metrics_endpoint))
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), front_door))
        .with_state(state)
}
