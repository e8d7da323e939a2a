use crate::catalog::{AmalanFlag, WorkoutType};
use crate::clock::DateKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
}

/// A user as shown to callers, without the stored password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmalanFlags {
    pub dzikir_pagi: bool,
    pub dzikir_petang: bool,
    pub tilawah: bool,
    pub sholat_dhuha: bool,
    pub sholat_tahajud: bool,
    pub sedekah: bool,
}

impl AmalanFlags {
    pub fn get(&self, flag: AmalanFlag) -> bool {
        match flag {
            AmalanFlag::DzikirPagi => self.dzikir_pagi,
            AmalanFlag::DzikirPetang => self.dzikir_petang,
            AmalanFlag::Tilawah => self.tilawah,
            AmalanFlag::SholatDhuha => self.sholat_dhuha,
            AmalanFlag::SholatTahajud => self.sholat_tahajud,
            AmalanFlag::Sedekah => self.sedekah,
        }
    }

    pub fn set(&mut self, flag: AmalanFlag, value: bool) {
        let slot = match flag {
            AmalanFlag::DzikirPagi => &mut self.dzikir_pagi,
            AmalanFlag::DzikirPetang => &mut self.dzikir_petang,
            AmalanFlag::Tilawah => &mut self.tilawah,
            AmalanFlag::SholatDhuha => &mut self.sholat_dhuha,
            AmalanFlag::SholatTahajud => &mut self.sholat_tahajud,
            AmalanFlag::Sedekah => &mut self.sedekah,
        };
        *slot = value;
    }

    pub fn completed(&self) -> u32 {
        AmalanFlag::ALL
            .iter()
            .filter(|flag| self.get(**flag))
            .count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAmalan {
    pub id: String,
    pub user_id: String,
    pub date: DateKey,
    pub amalan: AmalanFlags,
    /// Always equal to the number of set flags.
    pub completed_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWater {
    pub id: String,
    pub user_id: String,
    pub date: DateKey,
    pub current: u32,
    pub target: u32,
}

/// A stored workout type. Records written by older builds may carry a type
/// outside the current plan; those are kept verbatim and ignored by stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedWorkoutType {
    Current(WorkoutType),
    Stale(String),
}

impl RecordedWorkoutType {
    pub fn current(&self) -> Option<WorkoutType> {
        match self {
            RecordedWorkoutType::Current(kind) => Some(*kind),
            RecordedWorkoutType::Stale(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkout {
    pub id: String,
    pub user_id: String,
    pub date: DateKey,
    pub completed: bool,
    pub workout_type: RecordedWorkoutType,
    /// Minutes.
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: String,
    pub user_id: String,
    pub date: DateKey,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub category: String,
}

impl WalletTransaction {
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub category: String,
}

/// The persisted part of a wallet. The balance is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSettings {
    pub user_id: String,
    pub target: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: String,
    pub balance: f64,
    pub target: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmalanStats {
    pub total_completed: u32,
    pub daily_average: f64,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterStats {
    pub total_glasses: u32,
    pub daily_average: f64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: u32,
    pub streak: u32,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
    pub progress_to_target: f64,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AmalanFlagRequest {
    pub flag: AmalanFlag,
    pub value: bool,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub target: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: HistoryPeriod,
}

/// Everything the signed-in user tracks for today.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub date: DateKey,
    pub amalan: DailyAmalan,
    pub water: DailyWater,
    pub workout: DailyWorkout,
    pub wallet: Wallet,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub income: Vec<&'static str>,
    pub expense: Vec<&'static str>,
}
