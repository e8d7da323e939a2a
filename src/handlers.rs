use crate::catalog::{weekly_plan, WorkoutDetails, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
use crate::errors::AppError;
use crate::models::{
    AmalanFlagRequest, AmalanStats, CategoriesResponse, CredentialsRequest, DailyAmalan,
    DailyWater, DailyWorkout, NewTransaction, PeriodQuery, ProfileUpdate, TargetRequest,
    TodaySummary, UserProfile, Wallet, WalletStats, WalletTransaction, WaterStats, WorkoutStats,
};
use crate::notify::Notification;
use crate::rollover::RolloverOutcome;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

pub async fn get_today(State(state): State<AppState>) -> Result<Json<TodaySummary>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let summary = TodaySummary {
        date: tracker.today(),
        amalan: tracker.today_amalan()?,
        water: tracker.today_water()?,
        workout: tracker.today_workout()?,
        wallet: tracker.wallet()?,
    };
    Ok(Json(summary))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let mut tracker = state.tracker.lock().await;
    let profile = tracker.register(payload.username.trim(), &payload.password)?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let profile = tracker.login(payload.username.trim(), &payload.password)?;
    Ok(Json(profile))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.tracker.lock().await.logout()?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>) -> Result<Json<UserProfile>, AppError> {
    let tracker = state.tracker.lock().await;
    tracker.current_user().map(Json).ok_or_else(AppError::unauthorized)
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.update_profile(payload)?))
}

pub async fn amalan_today(State(state): State<AppState>) -> Result<Json<DailyAmalan>, AppError> {
    Ok(Json(state.tracker.lock().await.today_amalan()?))
}

pub async fn amalan_flag(
    State(state): State<AppState>,
    Json(payload): Json<AmalanFlagRequest>,
) -> Result<Json<DailyAmalan>, AppError> {
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.set_amalan_flag(payload.flag, payload.value)?))
}

pub async fn amalan_history(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<DailyAmalan>>, AppError> {
    Ok(Json(state.tracker.lock().await.amalan_history(query.period)?))
}

pub async fn amalan_stats(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<AmalanStats>, AppError> {
    Ok(Json(state.tracker.lock().await.amalan_stats(query.period)?))
}

pub async fn water_today(State(state): State<AppState>) -> Result<Json<DailyWater>, AppError> {
    Ok(Json(state.tracker.lock().await.today_water()?))
}

pub async fn water_add(State(state): State<AppState>) -> Result<Json<DailyWater>, AppError> {
    Ok(Json(state.tracker.lock().await.add_glass()?))
}

pub async fn water_remove(State(state): State<AppState>) -> Result<Json<DailyWater>, AppError> {
    Ok(Json(state.tracker.lock().await.remove_glass()?))
}

pub async fn water_history(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<DailyWater>>, AppError> {
    Ok(Json(state.tracker.lock().await.water_history(query.period)?))
}

pub async fn water_stats(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<WaterStats>, AppError> {
    Ok(Json(state.tracker.lock().await.water_stats(query.period)?))
}

pub async fn workout_today(State(state): State<AppState>) -> Result<Json<DailyWorkout>, AppError> {
    Ok(Json(state.tracker.lock().await.today_workout()?))
}

pub async fn workout_toggle(State(state): State<AppState>) -> Result<Json<DailyWorkout>, AppError> {
    Ok(Json(state.tracker.lock().await.toggle_workout()?))
}

pub async fn workout_history(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<DailyWorkout>>, AppError> {
    Ok(Json(state.tracker.lock().await.workout_history(query.period)?))
}

pub async fn workout_stats(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<WorkoutStats>, AppError> {
    Ok(Json(state.tracker.lock().await.workout_stats(query.period)?))
}

pub async fn workout_plan() -> Json<Vec<WorkoutDetails>> {
    Json(weekly_plan())
}

pub async fn wallet(State(state): State<AppState>) -> Result<Json<Wallet>, AppError> {
    Ok(Json(state.tracker.lock().await.wallet()?))
}

pub async fn wallet_target(
    State(state): State<AppState>,
    Json(payload): Json<TargetRequest>,
) -> Result<Json<Wallet>, AppError> {
    if !payload.target.is_finite() || payload.target <= 0.0 {
        return Err(AppError::bad_request("target must be a positive amount"));
    }
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.update_target(payload.target)?))
}

pub async fn add_transaction(
    State(state): State<AppState>,
    Json(payload): Json<NewTransaction>,
) -> Result<(StatusCode, Json<WalletTransaction>), AppError> {
    let mut tracker = state.tracker.lock().await;
    let transaction = tracker.add_transaction(payload)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.tracker.lock().await.delete_transaction(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transactions(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<WalletTransaction>>, AppError> {
    Ok(Json(state.tracker.lock().await.transactions(query.period)?))
}

pub async fn wallet_stats(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<WalletStats>, AppError> {
    Ok(Json(state.tracker.lock().await.wallet_stats(query.period)?))
}

pub async fn categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        income: INCOME_CATEGORIES.to_vec(),
        expense: EXPENSE_CATEGORIES.to_vec(),
    })
}

pub async fn rollover_check(State(state): State<AppState>) -> Result<Json<RolloverOutcome>, AppError> {
    Ok(Json(state.tracker.lock().await.check_rollover()?))
}

pub async fn notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.notifications.active())
}
