use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_spl::token::spl_token;
use anchor_spl::token::spl_token::solana_program::program_pack::Pack;
use async_trait::async_trait;
use log::{debug, warn};
use peer_lending::error::LendingError;
use solana_client::client_error::ClientError as RpcClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::InstructionError;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};

use crate::error::LedgerError;
use crate::ledger::{Ledger, TokenHolding, TxFailure, TxStatus};

/// Map a failed transaction to the protocol taxonomy where the program
/// raised the error, or to a plain description otherwise.
pub fn classify_failure(err: &TransactionError) -> TxFailure {
    if let TransactionError::InstructionError(_, InstructionError::Custom(code)) = err {
        if let Some(kind) = LendingError::from_code(*code) {
            return TxFailure::Program(kind);
        }
    }
    TxFailure::Other(err.to_string())
}

fn rpc_error(err: RpcClientError) -> LedgerError {
    LedgerError::Rpc(err.to_string())
}

/// Ledger backed by a cluster RPC endpoint, signing as one wallet
pub struct RpcLedger {
    client: RpcClient,
    payer: Keypair,
}

impl RpcLedger {
    pub fn new(rpc_url: String, commitment: CommitmentConfig, payer: Keypair) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, commitment),
            payer,
        }
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<TokenHolding>, LedgerError> {
        let keyed = self
            .client
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
            .await
            .map_err(rpc_error)?;

        let mut holdings = Vec::with_capacity(keyed.len());
        for account in keyed {
            let address: Pubkey = account
                .pubkey
                .parse()
                .map_err(|_| LedgerError::Rpc(format!("bad account key {}", account.pubkey)))?;
            // Re-read raw data rather than trust the parsed JSON encoding
            let raw = self.client.get_account(&address).await.map_err(rpc_error)?;
            match spl_token::state::Account::unpack(&raw.data) {
                Ok(token) => holdings.push(TokenHolding {
                    address,
                    mint: token.mint,
                    owner: token.owner,
                    amount: token.amount,
                }),
                Err(e) => warn!("Skipping undecodable token account {}: {}", address, e),
            }
        }
        Ok(holdings)
    }

    async fn mint_decimals(&self, mint: &Pubkey) -> Result<u8, LedgerError> {
        let account = self.client.get_account(mint).await.map_err(rpc_error)?;
        spl_token::state::Mint::unpack(&account.data)
            .map(|m| m.decimals)
            .map_err(|e| LedgerError::Rpc(format!("{mint} is not a mint: {e}")))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map_err(rpc_error)?;
        Ok(response.value.map(|account| account.data))
    }

    async fn submit(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<Signature, LedgerError> {
        if *payer != self.payer.pubkey() {
            return Err(LedgerError::Failed(format!(
                "cannot sign for {payer}; wallet is {}",
                self.payer.pubkey()
            )));
        }

        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(rpc_error)?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(payer),
            &[&self.payer],
            blockhash,
        );

        match self.client.send_transaction(&tx).await {
            Ok(signature) => {
                debug!("Sent transaction {}", signature);
                Ok(signature)
            }
            Err(err) => match err.get_transaction_error() {
                Some(tx_err) => match classify_failure(&tx_err) {
                    TxFailure::Program(kind) => Err(LedgerError::Rejected(kind)),
                    TxFailure::Other(reason) => Err(LedgerError::Failed(reason)),
                },
                None => Err(rpc_error(err)),
            },
        }
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TxStatus>, LedgerError> {
        let status = self
            .client
            .get_signature_status(signature)
            .await
            .map_err(rpc_error)?;
        Ok(status.map(|result| match result {
            Ok(()) => TxStatus::Confirmed,
            Err(err) => TxStatus::Failed(classify_failure(&err)),
        }))
    }
}
