use crate::clock::{month_range, week_range, DateKey, DateRange};
use crate::models::{
    AmalanStats, DailyAmalan, DailyWater, DailyWorkout, HistoryPeriod, Wallet, WalletStats,
    WalletTransaction, WaterStats, WorkoutStats, TransactionType,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

/// `None` for [`HistoryPeriod::Daily`], which covers the full history.
pub fn period_range(period: HistoryPeriod, today: NaiveDate) -> Option<DateRange> {
    match period {
        HistoryPeriod::Daily => None,
        HistoryPeriod::Weekly => Some(week_range(today)),
        HistoryPeriod::Monthly => Some(month_range(today)),
    }
}

pub fn in_period(date: &DateKey, range: Option<&DateRange>) -> bool {
    range.is_none_or(|range| range.contains(date))
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn average(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub fn amalan_stats(records: &[DailyAmalan]) -> AmalanStats {
    let total_completed: u32 = records.iter().map(|r| r.completed_count).sum();

    let mut newest_first: Vec<&DailyAmalan> = records.iter().collect();
    newest_first.sort_by(|a, b| b.date.cmp(&a.date));
    let streak = newest_first
        .iter()
        .take_while(|r| r.completed_count > 0)
        .count() as u32;

    AmalanStats {
        total_completed,
        daily_average: round1(average(f64::from(total_completed), records.len())),
        streak,
    }
}

pub fn water_stats(records: &[DailyWater]) -> WaterStats {
    let total_glasses: u32 = records.iter().map(|r| r.current).sum();
    let reached = records.iter().filter(|r| r.current >= r.target).count();

    WaterStats {
        total_glasses,
        daily_average: round1(average(f64::from(total_glasses), records.len())),
        completion_rate: round1(percentage(reached, records.len())),
    }
}

/// `window` feeds the totals and rate; `history` is the user's full record
/// set, walked backward from `today` for the streak.
pub fn workout_stats(window: &[DailyWorkout], history: &[DailyWorkout], today: NaiveDate) -> WorkoutStats {
    let total_workouts = window.iter().filter(|r| r.completed).count() as u32;

    let current: Vec<&DailyWorkout> = window
        .iter()
        .filter(|r| r.workout_type.current().is_some())
        .collect();
    let completed_current = current.iter().filter(|r| r.completed).count();

    WorkoutStats {
        total_workouts,
        streak: consecutive_day_streak(history.iter().filter(|r| r.completed).map(|r| &r.date), today),
        completion_rate: round1(percentage(completed_current, current.len())),
    }
}

/// Counts qualifying days walking back one calendar day at a time from
/// `today`, stopping at the first day without a qualifying record.
pub fn consecutive_day_streak<'a>(dates: impl Iterator<Item = &'a DateKey>, today: NaiveDate) -> u32 {
    let qualifying: HashSet<&DateKey> = dates.collect();
    let mut streak = 0;
    let mut day = today;
    while qualifying.contains(&DateKey::from_date(day)) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

pub fn wallet_balance<'a>(transactions: impl Iterator<Item = &'a WalletTransaction>) -> f64 {
    transactions.map(WalletTransaction::signed_amount).sum()
}

/// Totals cover `transactions`; progress uses the wallet's full balance.
pub fn wallet_stats(transactions: &[WalletTransaction], wallet: &Wallet) -> WalletStats {
    let sum_of = |kind: TransactionType| -> f64 {
        transactions
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.amount)
            .sum()
    };
    let total_income = sum_of(TransactionType::Income);
    let total_expense = sum_of(TransactionType::Expense);

    let progress_to_target = if wallet.target > 0.0 {
        (wallet.balance / wallet.target * 100.0).min(100.0)
    } else {
        0.0
    };

    WalletStats {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
        progress_to_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WorkoutType;
    use crate::models::{AmalanFlags, RecordedWorkoutType};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn amalan(date: &str, completed_count: u32) -> DailyAmalan {
        DailyAmalan {
            id: date.to_string(),
            user_id: "u".to_string(),
            date: DateKey::from(date),
            amalan: AmalanFlags::default(),
            completed_count,
            total_count: 6,
        }
    }

    fn water(date: &str, current: u32) -> DailyWater {
        DailyWater {
            id: date.to_string(),
            user_id: "u".to_string(),
            date: DateKey::from(date),
            current,
            target: 8,
        }
    }

    fn workout(date: NaiveDate, completed: bool, workout_type: RecordedWorkoutType) -> DailyWorkout {
        DailyWorkout {
            id: date.to_string(),
            user_id: "u".to_string(),
            date: DateKey::from_date(date),
            completed,
            workout_type,
            duration: 10,
        }
    }

    #[test]
    fn amalan_streak_stops_at_first_empty_day() {
        let records = vec![
            amalan("2024-01-01", 3),
            amalan("2024-01-02", 0),
            amalan("2024-01-03", 6),
            amalan("2024-01-04", 6),
        ];
        let stats = amalan_stats(&records);
        assert_eq!(stats.streak, 2);
        assert_eq!(stats.total_completed, 15);
        assert_eq!(stats.daily_average, 3.8);
    }

    #[test]
    fn amalan_stats_on_empty_history() {
        let stats = amalan_stats(&[]);
        assert_eq!(stats.daily_average, 0.0);
        assert_eq!(stats.streak, 0);
    }

    #[test]
    fn water_completion_rate_and_average() {
        let stats = water_stats(&[water("2024-01-01", 8), water("2024-01-02", 3)]);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.daily_average, 5.5);
        assert_eq!(stats.total_glasses, 11);
    }

    #[test]
    fn workout_streak_requires_contiguous_days() {
        let today = day(2024, 1, 10);
        let kind = RecordedWorkoutType::Current(WorkoutType::Core);
        let history = vec![
            workout(today, true, kind.clone()),
            workout(day(2024, 1, 9), true, kind.clone()),
            workout(day(2024, 1, 8), true, kind.clone()),
            workout(day(2024, 1, 6), true, kind.clone()),
            workout(day(2024, 1, 5), true, kind.clone()),
        ];
        let stats = workout_stats(&history, &history, today);
        assert_eq!(stats.streak, 3);
        assert_eq!(stats.total_workouts, 5);
    }

    #[test]
    fn workout_streak_is_zero_when_today_is_open() {
        let today = day(2024, 1, 10);
        let kind = RecordedWorkoutType::Current(WorkoutType::Core);
        let history = vec![
            workout(today, false, kind.clone()),
            workout(day(2024, 1, 9), true, kind),
        ];
        assert_eq!(workout_stats(&history, &history, today).streak, 0);
    }

    #[test]
    fn workout_completion_rate_ignores_stale_types() {
        let today = day(2024, 1, 10);
        let history = vec![
            workout(today, true, RecordedWorkoutType::Current(WorkoutType::LegsGlutes)),
            workout(day(2024, 1, 9), false, RecordedWorkoutType::Current(WorkoutType::Core)),
            workout(day(2024, 1, 8), false, RecordedWorkoutType::Stale("plank".into())),
        ];
        let stats = workout_stats(&history, &history, today);
        assert_eq!(stats.completion_rate, 50.0);
    }

    #[test]
    fn wallet_progress_is_capped() {
        let tx = |kind, amount: f64| WalletTransaction {
            id: amount.to_string(),
            user_id: "u".to_string(),
            date: DateKey::from("2024-01-01"),
            kind,
            amount,
            description: "x".to_string(),
            category: "Other".to_string(),
        };
        let transactions = vec![
            tx(TransactionType::Income, 500.0),
            tx(TransactionType::Expense, 200.0),
        ];
        let balance = wallet_balance(transactions.iter());
        assert_eq!(balance, 300.0);

        let wallet = Wallet {
            user_id: "u".to_string(),
            balance,
            target: 200.0,
            last_updated: String::new(),
        };
        let stats = wallet_stats(&transactions, &wallet);
        assert_eq!(stats.net_balance, 300.0);
        assert_eq!(stats.progress_to_target, 100.0);

        let halfway = Wallet { target: 600.0, ..wallet };
        assert_eq!(wallet_stats(&transactions, &halfway).progress_to_target, 50.0);
    }

    #[test]
    fn period_ranges() {
        let today = day(2024, 1, 3);
        assert!(period_range(HistoryPeriod::Daily, today).is_none());
        let week = period_range(HistoryPeriod::Weekly, today).unwrap();
        assert!(in_period(&DateKey::from("2023-12-31"), Some(&week)));
        assert!(!in_period(&DateKey::from("2023-12-30"), Some(&week)));
        assert!(in_period(&DateKey::from("1999-01-01"), None));
    }
}
