//! Custody ledger for the stable settlement asset

use crate::route::{AssetId, Identity, VenueId, MAX_AMOUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Trade records kept by default; older ones are evicted first
pub const DEFAULT_RECORD_LIMIT: usize = 1_000;

/// Ledger failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Credits and debits must move a positive amount
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Only the stable settlement asset is held in custody
    #[error("ledger holds {expected}, not {found}")]
    WrongAsset {
        /// Stable settlement asset
        expected: AssetId,
        /// Asset presented
        found: AssetId,
    },

    /// Debit larger than the balance
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount requested
        requested: u128,
        /// Balance available
        available: u128,
    },

    /// Credit would exceed the supported amount range
    #[error("balance overflow")]
    Overflow,

    /// Committed balance moved after the transaction was opened
    #[error("stale transaction: opened at {expected}, ledger now at {actual}")]
    StaleBalance {
        /// Balance when the transaction was opened
        expected: u128,
        /// Balance at commit time
        actual: u128,
    },
}

/// Direction of a ledger movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Funds received into custody
    Credit,
    /// Funds leaving custody
    Debit,
}

/// One staged movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Direction
    pub kind: EntryKind,
    /// Amount moved
    pub amount: u128,
    /// Staged balance after the movement
    pub balance_after: u128,
}

/// Settled trade, appended on commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Execution identifier
    pub execution_id: Uuid,
    /// Identity that submitted the route
    pub submitter: Identity,
    /// Venues in leg order
    pub venues: Vec<VenueId>,
    /// Stable amount funded from custody
    pub principal: u128,
    /// Stable amount returned
    pub final_output: u128,
    /// `final_output - principal`
    pub realized_profit: u128,
    /// Realised ratio in basis points, floored
    pub realized_bps: u128,
    /// Gas cost reported to the submitter
    pub gas_cost: u128,
    /// Settlement time
    pub settled_at: DateTime<Utc>,
}

/// Committed custody state of the stable asset
#[derive(Debug, Clone)]
pub struct SettlementLedger {
    stable_asset: AssetId,
    balance: u128,
    total_realized_profit: u128,
    trades_settled: u64,
    record_limit: usize,
    records: VecDeque<TradeRecord>,
}

impl SettlementLedger {
    /// Create a ledger holding `opening_balance` of `stable_asset`
    pub fn new(stable_asset: AssetId, opening_balance: u128) -> Self {
        Self::with_record_limit(stable_asset, opening_balance, DEFAULT_RECORD_LIMIT)
    }

    /// Create a ledger that keeps at most `record_limit` trade records
    pub fn with_record_limit(stable_asset: AssetId, opening_balance: u128, record_limit: usize) -> Self {
        Self {
            stable_asset,
            balance: opening_balance.min(MAX_AMOUNT),
            total_realized_profit: 0,
            trades_settled: 0,
            record_limit: record_limit.max(1),
            records: VecDeque::new(),
        }
    }

    /// Stable settlement asset
    pub fn stable_asset(&self) -> &AssetId {
        &self.stable_asset
    }

    /// Committed balance
    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Sum of realised profit over all recorded trades
    pub fn total_realized_profit(&self) -> u128 {
        self.total_realized_profit
    }

    /// Trades settled since deployment, evicted records included
    pub fn trades_settled(&self) -> u64 {
        self.trades_settled
    }

    /// Retained trade records, oldest first
    pub fn records(&self) -> &VecDeque<TradeRecord> {
        &self.records
    }

    /// The `limit` most recent records, oldest first
    pub fn recent_records(&self, limit: usize) -> Vec<TradeRecord> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }

    /// Credit the committed balance directly
    pub fn credit(&mut self, asset: &AssetId, amount: u128) -> std::result::Result<u128, LedgerError> {
        self.balance = apply_credit(&self.stable_asset, self.balance, asset, amount)?;
        Ok(self.balance)
    }

    /// Debit the committed balance directly
    pub fn debit(&mut self, asset: &AssetId, amount: u128) -> std::result::Result<u128, LedgerError> {
        self.balance = apply_debit(&self.stable_asset, self.balance, asset, amount)?;
        Ok(self.balance)
    }

    /// Open a staged transaction against the current balance
    pub fn begin(&self) -> LedgerTransaction {
        LedgerTransaction {
            stable_asset: self.stable_asset.clone(),
            opening_balance: self.balance,
            balance: self.balance,
            journal: Vec::new(),
        }
    }
}

/// Staged movements applied to the ledger only on commit.
///
/// Dropping a transaction discards every staged movement.
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    stable_asset: AssetId,
    opening_balance: u128,
    balance: u128,
    journal: Vec<LedgerEntry>,
}

impl LedgerTransaction {
    /// Balance when the transaction was opened
    pub fn opening_balance(&self) -> u128 {
        self.opening_balance
    }

    /// Staged balance
    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Staged movements in order
    pub fn journal(&self) -> &[LedgerEntry] {
        &self.journal
    }

    /// Stage a credit
    pub fn credit(&mut self, asset: &AssetId, amount: u128) -> std::result::Result<u128, LedgerError> {
        self.balance = apply_credit(&self.stable_asset, self.balance, asset, amount)?;
        self.journal.push(LedgerEntry {
            kind: EntryKind::Credit,
            amount,
            balance_after: self.balance,
        });
        Ok(self.balance)
    }

    /// Stage a debit
    pub fn debit(&mut self, asset: &AssetId, amount: u128) -> std::result::Result<u128, LedgerError> {
        self.balance = apply_debit(&self.stable_asset, self.balance, asset, amount)?;
        self.journal.push(LedgerEntry {
            kind: EntryKind::Debit,
            amount,
            balance_after: self.balance,
        });
        Ok(self.balance)
    }

    /// Apply the staged balance and append `record`, all or nothing
    pub fn commit(
        self,
        ledger: &mut SettlementLedger,
        record: TradeRecord,
    ) -> std::result::Result<u128, LedgerError> {
        if ledger.balance != self.opening_balance {
            return Err(LedgerError::StaleBalance {
                expected: self.opening_balance,
                actual: ledger.balance,
            });
        }
        if ledger.stable_asset != self.stable_asset {
            return Err(LedgerError::WrongAsset {
                expected: ledger.stable_asset.clone(),
                found: self.stable_asset,
            });
        }
        let total = ledger
            .total_realized_profit
            .checked_add(record.realized_profit)
            .ok_or(LedgerError::Overflow)?;

        ledger.balance = self.balance;
        ledger.total_realized_profit = total;
        ledger.trades_settled += 1;
        if ledger.records.len() == ledger.record_limit {
            ledger.records.pop_front();
        }
        ledger.records.push_back(record);
        Ok(ledger.balance)
    }
}

fn apply_credit(
    stable: &AssetId,
    balance: u128,
    asset: &AssetId,
    amount: u128,
) -> std::result::Result<u128, LedgerError> {
    check_movement(stable, asset, amount)?;
    balance
        .checked_add(amount)
        .filter(|next| *next <= MAX_AMOUNT)
        .ok_or(LedgerError::Overflow)
}

fn apply_debit(
    stable: &AssetId,
    balance: u128,
    asset: &AssetId,
    amount: u128,
) -> std::result::Result<u128, LedgerError> {
    check_movement(stable, asset, amount)?;
    balance.checked_sub(amount).ok_or(LedgerError::InsufficientBalance {
        requested: amount,
        available: balance,
    })
}

fn check_movement(stable: &AssetId, asset: &AssetId, amount: u128) -> std::result::Result<(), LedgerError> {
    if asset != stable {
        return Err(LedgerError::WrongAsset {
            expected: stable.clone(),
            found: asset.clone(),
        });
    }
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    Ok(())
}
