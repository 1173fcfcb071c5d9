//! The ledger seam: everything the client needs from a chain.
//!
//! [`RpcLedger`] talks to a cluster; [`InMemoryLedger`] executes the program's
//! transitions locally.

pub mod instruction;
pub mod memory;
pub mod rpc;

pub use instruction::LendingInstruction;
pub use memory::InMemoryLedger;
pub use rpc::RpcLedger;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::AccountDeserialize;
use async_trait::async_trait;
use peer_lending::error::LendingError;
use solana_sdk::signature::Signature;

use crate::error::{ClientError, LedgerError};

/// An SPL token account as the client sees it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHolding {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

/// Why a landed transaction failed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxFailure {
    Program(LendingError),
    Other(String),
}

/// Final status of a submitted signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Confirmed,
    Failed(TxFailure),
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Token accounts of `mint` owned by `owner`
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenHolding>, LedgerError>;

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8, LedgerError>;

    /// Raw account data, `None` if the account does not exist
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Send a transaction signed by `payer`. A rejection caught before the
    /// transaction lands (preflight) is returned as an error.
    async fn submit(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<Signature, LedgerError>;

    /// `None` while the signature is not yet confirmed
    async fn signature_status(&self, signature: &Signature)
        -> Result<Option<TxStatus>, LedgerError>;
}

/// Fetch and decode an Anchor account; `None` if it does not exist
pub async fn fetch_account<T, L>(ledger: &L, address: &Pubkey) -> Result<Option<T>, ClientError>
where
    T: AccountDeserialize,
    L: Ledger + ?Sized,
{
    let Some(data) = ledger.account_data(address).await? else {
        return Ok(None);
    };
    T::try_deserialize(&mut data.as_slice())
        .map(Some)
        .map_err(|e| ClientError::AccountDecode {
            address: *address,
            reason: e.to_string(),
        })
}

/// Like [`fetch_account`] but absence is an error
pub async fn require_account<T, L>(ledger: &L, address: &Pubkey) -> Result<T, ClientError>
where
    T: AccountDeserialize,
    L: Ledger + ?Sized,
{
    fetch_account(ledger, address)
        .await?
        .ok_or(ClientError::AccountNotFound(*address))
}
