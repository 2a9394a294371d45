//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the marketplace node's HTTP
//! interface. All endpoints share application state through axum's
//! `State` extractor; every mutating endpoint takes the market's write
//! lock for the full operation, which is what serializes marketplace
//! operations at the service boundary.
//!
//! ## Endpoints
//!
//! | Method | Path                             | Description                    |
//! |--------|----------------------------------|--------------------------------|
//! | GET    | `/health`                        | Liveness probe                 |
//! | GET    | `/status`                        | Node status summary            |
//! | POST   | `/tokens/mint`                   | Mint a token (local registry)  |
//! | POST   | `/tokens/approve`                | Grant/revoke transfer approval |
//! | POST   | `/listings`                      | List an item for sale          |
//! | POST   | `/listings/cancel`               | Cancel an own listing          |
//! | POST   | `/listings/price`                | Reprice an own listing         |
//! | POST   | `/purchases`                     | Buy a listed item              |
//! | POST   | `/withdrawals`                   | Withdraw accumulated proceeds  |
//! | GET    | `/listings/:collection/:token_id`| Listing by item key            |
//! | GET    | `/proceeds/:account`             | Withdrawable balance           |
//! | GET    | `/events`                        | Append-only event log          |
//! | GET    | `/ws`                            | WebSocket for live events      |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vitrine_market::events::MarketEvent;
use vitrine_market::market::{MarketError, Marketplace};
use vitrine_market::nft::NftRegistry;
use vitrine_market::oracle::OracleError;
use vitrine_market::proceeds::ProceedsError;
use vitrine_market::settlement::SettlementRail;
use vitrine_market::types::ItemKey;

use crate::metrics::SharedMetrics;

/// The concrete marketplace this node serves: in-memory collections and
/// the recording settlement rail.
pub type Market = Marketplace<NftRegistry, SettlementRail>;

/// The marketplace behind the lock that serializes every operation.
pub type SharedMarket = Arc<RwLock<Market>>;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network identifier (e.g., "devnet", "testnet", "mainnet").
    pub network: String,
    /// The marketplace ledger. The write lock is the operation boundary.
    pub market: SharedMarket,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<MarketEvent>,
    /// How many log entries have been forwarded to `event_tx` so far.
    /// Only touched while holding the market's write lock.
    pub events_forwarded: Arc<AtomicUsize>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Forwards any not-yet-broadcast events and refreshes the gauges.
    /// Call after a mutating operation, while still holding the write lock.
    fn after_mutation(&self, market: &Market) {
        let events = market.events();
        let seen = self.events_forwarded.load(Ordering::Relaxed);
        for event in events.get(seen..).unwrap_or(&[]) {
            // Send fails only when nobody subscribes; the log still has it.
            let _ = self.event_tx.send(event.clone());
        }
        self.events_forwarded.store(events.len(), Ordering::Relaxed);

        self.metrics
            .active_listings
            .set(market.active_listings() as i64);
        self.metrics
            .escrowed_proceeds
            .set(market.escrowed_proceeds().min(i64::MAX as u64) as i64);
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/tokens/mint", post(mint_handler))
        .route("/tokens/approve", post(approve_handler))
        .route("/listings", post(list_handler))
        .route("/listings/cancel", post(cancel_handler))
        .route("/listings/price", post(price_handler))
        .route("/purchases", post(purchase_handler))
        .route("/withdrawals", post(withdraw_handler))
        .route("/listings/:collection/:token_id", get(listing_handler))
        .route("/proceeds/:account", get(proceeds_handler))
        .route("/events", get(events_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /tokens/mint`.
#[derive(Debug, Deserialize)]
pub struct MintRequest {
    /// Collection to mint into (created on first mint).
    pub collection: String,
    /// Account that receives the freshly minted token.
    pub owner: String,
}

/// Response payload for `POST /tokens/mint`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MintResponse {
    pub collection: String,
    pub token_id: u64,
    pub owner: String,
}

/// Request body for `POST /tokens/approve`.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub collection: String,
    pub token_id: u64,
    /// Must be the token's current owner.
    pub caller: String,
    /// `true` grants the marketplace transfer authority, `false` revokes.
    pub approved: bool,
}

/// Request body for `POST /listings`.
#[derive(Debug, Deserialize)]
pub struct ListRequest {
    pub collection: String,
    pub token_id: u64,
    /// Must be the token's current owner.
    pub seller: String,
    /// Asking price in the smallest currency unit. Must be positive.
    pub price: u64,
}

/// Request body for `POST /listings/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub collection: String,
    pub token_id: u64,
    /// Must be the listing's seller.
    pub caller: String,
}

/// Request body for `POST /listings/price`.
#[derive(Debug, Deserialize)]
pub struct PriceUpdateRequest {
    pub collection: String,
    pub token_id: u64,
    /// Must be the listing's seller.
    pub caller: String,
    /// New asking price. Must be positive.
    pub new_price: u64,
}

/// Request body for `POST /purchases`.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub collection: String,
    pub token_id: u64,
    pub buyer: String,
    /// Attached payment. Anything above the listing price is retained.
    pub payment: u64,
}

/// Request body for `POST /withdrawals`.
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub account: String,
}

/// Response payload for `POST /withdrawals`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub account: String,
    /// Amount paid out (the full prior balance).
    pub amount: u64,
}

/// Response payload for `GET /listings/:collection/:token_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingResponse {
    pub collection: String,
    pub token_id: u64,
    pub seller: String,
    pub price: u64,
    /// ISO-8601 timestamp of when the item was listed.
    pub listed_at: String,
}

/// Response payload for `GET /proceeds/:account`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProceedsResponse {
    pub account: String,
    /// Withdrawable balance, zero for unknown accounts.
    pub balance: u64,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network identifier.
    pub network: String,
    /// Number of active listings.
    pub active_listings: u64,
    /// Number of events emitted since startup.
    pub events_emitted: u64,
    /// Sum of all withdrawable seller balances.
    pub escrowed_proceeds: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps a marketplace rejection to an HTTP status.
///
/// Authorization failures are 403, lifecycle-state conflicts 409,
/// validation failures 400, and collaborator failures 502 — the request
/// was fine, the world behind the marketplace wasn't.
fn market_error_status(err: &MarketError) -> StatusCode {
    match err {
        MarketError::OnlyOwnerCanListItems => StatusCode::FORBIDDEN,
        MarketError::PriceTooLow
        | MarketError::PriceNotMet { .. }
        | MarketError::MarketPlaceNotApproved => StatusCode::BAD_REQUEST,
        MarketError::Listing(_) => StatusCode::CONFLICT,
        MarketError::Proceeds(ProceedsError::NoProceeds(_)) => StatusCode::CONFLICT,
        MarketError::Proceeds(_) => StatusCode::INTERNAL_SERVER_ERROR,
        MarketError::Transfer(_) | MarketError::Payout(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Maps an ownership-oracle rejection (mint/approve surface) to a status.
fn oracle_error_status(err: &OracleError) -> StatusCode {
    match err {
        OracleError::UnknownToken { .. } => StatusCode::NOT_FOUND,
        OracleError::NotTokenOwner { .. } => StatusCode::FORBIDDEN,
    }
}

fn market_error_response(err: MarketError) -> axum::response::Response {
    (
        market_error_status(&err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let market = state.market.read().await;

    let resp = StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        active_listings: market.active_listings() as u64,
        events_emitted: market.events().len() as u64,
        escrowed_proceeds: market.escrowed_proceeds(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /tokens/mint` — mints a token in the node's local registry.
///
/// This surface exists so local deployments and tests can create items to
/// trade; a production deployment would point the oracle seam at a real
/// token authority instead.
async fn mint_handler(
    State(state): State<AppState>,
    Json(req): Json<MintRequest>,
) -> impl IntoResponse {
    let mut market = state.market.write().await;
    let token_id = market.oracle_mut().mint(&req.collection, &req.owner);
    tracing::info!(
        collection = %req.collection,
        token_id,
        owner = %req.owner,
        "token minted"
    );

    (
        StatusCode::CREATED,
        Json(MintResponse {
            collection: req.collection,
            token_id,
            owner: req.owner,
        }),
    )
}

/// `POST /tokens/approve` — grants or revokes the marketplace's transfer
/// authority over a token. Only the current owner may call it.
async fn approve_handler(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> impl IntoResponse {
    let mut market = state.market.write().await;
    let key = ItemKey::new(req.collection.as_str(), req.token_id);

    match market
        .oracle_mut()
        .set_approval(&key, &req.caller, req.approved)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (
            oracle_error_status(&err),
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /listings` — offers a token for sale.
async fn list_handler(
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> impl IntoResponse {
    let _timer = state.metrics.operation_latency_seconds.start_timer();
    let mut market = state.market.write().await;

    match market.list_item(&req.seller, &req.collection, req.token_id, req.price) {
        Ok(()) => {
            state.metrics.listings_created_total.inc();
            state.after_mutation(&market);
            tracing::info!(
                collection = %req.collection,
                token_id = req.token_id,
                seller = %req.seller,
                price = req.price,
                "item listed"
            );
            StatusCode::CREATED.into_response()
        }
        Err(err) => market_error_response(err),
    }
}

/// `POST /listings/cancel` — withdraws the caller's own listing.
async fn cancel_handler(
    State(state): State<AppState>,
    Json(req): Json<CancelRequest>,
) -> impl IntoResponse {
    let _timer = state.metrics.operation_latency_seconds.start_timer();
    let mut market = state.market.write().await;

    match market.cancel_listing(&req.caller, &req.collection, req.token_id) {
        Ok(()) => {
            state.metrics.listings_cancelled_total.inc();
            state.after_mutation(&market);
            tracing::info!(
                collection = %req.collection,
                token_id = req.token_id,
                "listing cancelled"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => market_error_response(err),
    }
}

/// `POST /listings/price` — reprices the caller's own listing.
async fn price_handler(
    State(state): State<AppState>,
    Json(req): Json<PriceUpdateRequest>,
) -> impl IntoResponse {
    let _timer = state.metrics.operation_latency_seconds.start_timer();
    let mut market = state.market.write().await;

    match market.update_listing(&req.caller, &req.collection, req.token_id, req.new_price) {
        Ok(()) => {
            state.metrics.price_updates_total.inc();
            state.after_mutation(&market);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => market_error_response(err),
    }
}

/// `POST /purchases` — buys a listed item.
async fn purchase_handler(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> impl IntoResponse {
    let _timer = state.metrics.operation_latency_seconds.start_timer();
    let mut market = state.market.write().await;

    // Read the price before the listing is consumed — the volume counter
    // wants the credited amount, not the attached payment.
    let price = market
        .listing_of(&req.collection, req.token_id)
        .map(|l| l.price);

    match market.buy_item(&req.buyer, &req.collection, req.token_id, req.payment) {
        Ok(()) => {
            state.metrics.items_sold_total.inc();
            if let Some(price) = price {
                state.metrics.sale_volume_total.inc_by(price);
            }
            state.after_mutation(&market);
            tracing::info!(
                collection = %req.collection,
                token_id = req.token_id,
                buyer = %req.buyer,
                payment = req.payment,
                "item sold"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => market_error_response(err),
    }
}

/// `POST /withdrawals` — pays out the account's full proceeds balance.
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> impl IntoResponse {
    let _timer = state.metrics.operation_latency_seconds.start_timer();
    let mut market = state.market.write().await;

    match market.withdraw_proceeds(&req.account) {
        Ok(amount) => {
            state.metrics.proceeds_withdrawn_total.inc_by(amount);
            state.after_mutation(&market);
            tracing::info!(account = %req.account, amount, "proceeds withdrawn");
            (
                StatusCode::OK,
                Json(WithdrawResponse {
                    account: req.account,
                    amount,
                }),
            )
                .into_response()
        }
        Err(err) => market_error_response(err),
    }
}

/// `GET /listings/:collection/:token_id` — returns the active listing.
///
/// Returns 404 if the item is not currently offered.
async fn listing_handler(
    Path((collection, token_id)): Path<(String, u64)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let market = state.market.read().await;

    match market.listing_of(&collection, token_id) {
        Some(listing) => (
            StatusCode::OK,
            Json(serde_json::to_value(ListingResponse {
                collection,
                token_id,
                seller: listing.seller.clone(),
                price: listing.price,
                listed_at: listing.listed_at.to_rfc3339(),
            })
            .expect("listing response serializes")),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("not listed: {collection}#{token_id}"),
            }),
        )
            .into_response(),
    }
}

/// `GET /proceeds/:account` — returns the withdrawable balance.
///
/// Unknown accounts are a zero balance, not an error.
async fn proceeds_handler(
    Path(account): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let market = state.market.read().await;
    let balance = market.proceeds_of(&account);

    Json(ProceedsResponse { account, balance })
}

/// `GET /events` — the full append-only event log, in emission order.
///
/// This is the indexer surface: consumers that missed the live stream
/// re-read the log from here.
async fn events_handler(State(state): State<AppState>) -> impl IntoResponse {
    let market = state.market.read().await;
    Json(market.events().to_vec())
}

/// `GET /ws` — WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`MarketEvent`] messages as operations
/// complete. The connection is read-only from the server's perspective;
/// client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client disconnected.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Client messages are ignored — this is a push-only channel.
                    }
                    _ => break, // Disconnected or error.
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
