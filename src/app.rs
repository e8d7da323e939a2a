use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/today", get(handlers::get_today))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/profile", put(handlers::update_profile))
        .route("/api/amalan/today", get(handlers::amalan_today))
        .route("/api/amalan/flag", post(handlers::amalan_flag))
        .route("/api/amalan/history", get(handlers::amalan_history))
        .route("/api/amalan/stats", get(handlers::amalan_stats))
        .route("/api/water/today", get(handlers::water_today))
        .route("/api/water/add", post(handlers::water_add))
        .route("/api/water/remove", post(handlers::water_remove))
        .route("/api/water/history", get(handlers::water_history))
        .route("/api/water/stats", get(handlers::water_stats))
        .route("/api/workout/today", get(handlers::workout_today))
        .route("/api/workout/toggle", post(handlers::workout_toggle))
        .route("/api/workout/history", get(handlers::workout_history))
        .route("/api/workout/stats", get(handlers::workout_stats))
        .route("/api/workout/plan", get(handlers::workout_plan))
        .route("/api/wallet", get(handlers::wallet))
        .route("/api/wallet/target", put(handlers::wallet_target))
        .route(
            "/api/wallet/transactions",
            get(handlers::transactions).post(handlers::add_transaction),
        )
        .route("/api/wallet/transactions/:id", delete(handlers::delete_transaction))
        .route("/api/wallet/stats", get(handlers::wallet_stats))
        .route("/api/wallet/categories", get(handlers::categories))
        .route("/api/rollover/check", post(handlers::rollover_check))
        .route("/api/notifications", get(handlers::notifications))
        .with_state(state)
}
