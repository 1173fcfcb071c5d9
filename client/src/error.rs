use anchor_lang::prelude::Pubkey;
use peer_lending::error::LendingError;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// Address derivation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Failures reported by a ledger backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The program rejected the transaction with one of its own error kinds
    #[error("rejected by program: {0}")]
    Rejected(LendingError),

    /// The transaction failed for a reason outside the program's taxonomy
    /// (signer checks, seed constraints, token program errors)
    #[error("transaction failed: {0}")]
    Failed(String),

    #[error("malformed instruction: {0}")]
    MalformedInstruction(String),

    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Failures detected while building a transaction, before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Terms the program would reject, caught locally
    #[error("invalid terms: {0}")]
    InvalidTerms(LendingError),

    #[error("no token account for mint {mint} owned by {owner}")]
    NoTokenAccount { owner: Pubkey, mint: Pubkey },

    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("account {0} does not exist")]
    AccountNotFound(Pubkey),

    #[error("could not decode account {address}: {reason}")]
    AccountDecode { address: Pubkey, reason: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<DeriveError> for ClientError {
    fn from(err: DeriveError) -> Self {
        match err {
            DeriveError::InvalidInput(msg) => ClientError::InvalidAddress(msg),
        }
    }
}

/// Outcome of a settlement attempt that did not confirm
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Nothing was submitted
    #[error(transparent)]
    Build(#[from] ClientError),

    /// The program rejected the transaction; no state changed
    #[error("rejected by program: {0}")]
    Rejected(LendingError),

    /// Submitted but unconfirmed within the deadline. The outcome is
    /// unknown: re-query state before retrying.
    #[error("confirmation of {signature} timed out")]
    TimedOut { signature: Signature },

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for SettlementError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(kind) => SettlementError::Rejected(kind),
            other => SettlementError::Ledger(other),
        }
    }
}

impl SettlementError {
    /// Protocol error kind, when the program made the call
    pub fn lending_error(&self) -> Option<LendingError> {
        match self {
            SettlementError::Rejected(kind) => Some(*kind),
            SettlementError::Build(ClientError::InvalidTerms(kind)) => Some(*kind),
            _ => None,
        }
    }
}

/// Off-chain mirror failures. Never fatal to a settled transaction.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mirror responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed mirror payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
