//! Custody and settlement of the stable asset

pub mod ledger;

pub use ledger::{
    EntryKind, LedgerEntry, LedgerError, LedgerTransaction, SettlementLedger, TradeRecord,
    DEFAULT_RECORD_LIMIT,
};
