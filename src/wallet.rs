//! Savings ledger. The balance is always derived from the user's
//! transactions; only the target is stored on the wallet itself.

use crate::clock::{DateKey, DateRange};
use crate::errors::{TrackerError, TrackerResult};
use crate::models::{NewTransaction, Wallet, WalletSettings, WalletStats, WalletTransaction};
use crate::stats::{in_period, wallet_balance, wallet_stats};
use crate::storage::KeyValueStore;
use crate::store::{new_record_id, no_migration, RecordStore};
use tracing::debug;

pub const WALLET_STORAGE_KEY: &str = "wallet-storage";
pub const TRANSACTIONS_STORAGE_KEY: &str = "wallet-transactions";
const WALLET_SCHEMA_VERSION: u32 = 0;
pub const DEFAULT_SAVINGS_TARGET: f64 = 1_000_000.0;

#[derive(Debug, Clone)]
pub struct WalletTracker {
    wallets: RecordStore<WalletSettings>,
    transactions: RecordStore<WalletTransaction>,
}

impl Default for WalletTracker {
    fn default() -> Self {
        Self {
            wallets: RecordStore::new(WALLET_STORAGE_KEY, WALLET_SCHEMA_VERSION),
            transactions: RecordStore::new(TRANSACTIONS_STORAGE_KEY, WALLET_SCHEMA_VERSION),
        }
    }
}

impl WalletTracker {
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        Self {
            wallets: RecordStore::load(kv, WALLET_STORAGE_KEY, WALLET_SCHEMA_VERSION, no_migration),
            transactions: RecordStore::load(
                kv,
                TRANSACTIONS_STORAGE_KEY,
                WALLET_SCHEMA_VERSION,
                no_migration,
            ),
        }
    }

    pub fn flush(&mut self, kv: &dyn KeyValueStore) -> TrackerResult<()> {
        self.wallets.flush(kv)?;
        self.transactions.flush(kv)
    }

    fn settings_mut(&mut self, user_id: &str, now: &str) -> &mut WalletSettings {
        self.wallets.find_or_insert_with(
            |w| w.user_id == user_id,
            || WalletSettings {
                user_id: user_id.to_string(),
                target: DEFAULT_SAVINGS_TARGET,
                last_updated: now.to_string(),
            },
        )
    }

    /// The user's wallet, created with the default target on first access.
    pub fn wallet(&mut self, user_id: &str, now: &str) -> Wallet {
        let settings = self.settings_mut(user_id, now).clone();
        Wallet {
            balance: self.balance(user_id),
            user_id: settings.user_id,
            target: settings.target,
            last_updated: settings.last_updated,
        }
    }

    pub fn balance(&self, user_id: &str) -> f64 {
        wallet_balance(
            self.transactions
                .records()
                .iter()
                .filter(|t| t.user_id == user_id),
        )
    }

    pub fn add_transaction(
        &mut self,
        user_id: &str,
        today: &DateKey,
        now: &str,
        new: NewTransaction,
    ) -> TrackerResult<WalletTransaction> {
        if !new.amount.is_finite() || new.amount <= 0.0 {
            return Err(TrackerError::validation("amount must be greater than 0"));
        }
        let description = new.description.trim();
        if description.is_empty() {
            return Err(TrackerError::validation("description must not be empty"));
        }
        let category = new.category.trim();
        if category.is_empty() {
            return Err(TrackerError::validation("category must not be empty"));
        }

        let transaction = WalletTransaction {
            id: new_record_id(),
            user_id: user_id.to_string(),
            date: today.clone(),
            kind: new.kind,
            amount: new.amount,
            description: description.to_string(),
            category: category.to_string(),
        };
        self.transactions.append(transaction.clone());
        self.touch(user_id, now);
        debug!(user_id, id = %transaction.id, "transaction added");
        Ok(transaction)
    }

    /// Only the owner's transactions can be removed.
    pub fn delete_transaction(&mut self, user_id: &str, transaction_id: &str, now: &str) -> TrackerResult<()> {
        let removed = self
            .transactions
            .retain(|t| !(t.id == transaction_id && t.user_id == user_id));
        if removed == 0 {
            return Err(TrackerError::NotFound(format!("transaction {transaction_id}")));
        }
        self.touch(user_id, now);
        Ok(())
    }

    pub fn update_target(&mut self, user_id: &str, target: f64, now: &str) -> Wallet {
        let settings = self.settings_mut(user_id, now);
        settings.target = target;
        settings.last_updated = now.to_string();
        self.wallets.mark_dirty();
        self.wallet(user_id, now)
    }

    fn touch(&mut self, user_id: &str, now: &str) {
        self.settings_mut(user_id, now).last_updated = now.to_string();
        self.wallets.mark_dirty();
    }

    pub fn history(&self, user_id: &str, range: Option<&DateRange>) -> Vec<WalletTransaction> {
        self.transactions
            .filter(|t| t.user_id == user_id && in_period(&t.date, range))
    }

    pub fn stats(&mut self, user_id: &str, range: Option<&DateRange>, now: &str) -> WalletStats {
        let wallet = self.wallet(user_id, now);
        wallet_stats(&self.history(user_id, range), &wallet)
    }
}
