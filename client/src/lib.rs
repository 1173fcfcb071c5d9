//! Client for the peer lending program: address derivation, transaction
//! building, settlement and the off-chain marketplace mirror.

pub mod bridge;
pub mod builder;
pub mod config;
pub mod error;
pub mod ledger;
pub mod mirror;
pub mod pda;
pub mod tokens;

use std::sync::Arc;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use peer_lending::state::{BorrowerProfile, Loan, LoanOffer, Obligation};
use solana_sdk::signature::{Keypair, Signature};

pub use bridge::SettlementBridge;
pub use builder::{BuiltTransaction, CollateralParams, Intent, OfferParams, TransactionBuilder};
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, DeriveError, LedgerError, MirrorError, SettlementError};
pub use ledger::{InMemoryLedger, Ledger, RpcLedger};
pub use mirror::{HttpMirror, Mirror, MirrorUpdate};

/// One wallet's view of the protocol: build, settle, re-query
pub struct LendingClient<L: ?Sized> {
    ledger: Arc<L>,
    builder: TransactionBuilder<L>,
    bridge: SettlementBridge<L>,
    confirm_timeout: Duration,
}

impl LendingClient<RpcLedger> {
    /// Client against the configured cluster, signing with `wallet`
    pub fn connect(config: &ClientConfig, wallet: Keypair) -> Result<Self, ConfigError> {
        let ledger = Arc::new(RpcLedger::new(
            config.rpc_url.clone(),
            config.commitment()?,
            wallet,
        ));
        let mirror = config
            .mirror_url
            .as_ref()
            .map(|url| Arc::new(HttpMirror::new(url.clone())) as Arc<dyn Mirror>);
        Self::new(ledger, config, mirror)
    }
}

impl<L: Ledger + ?Sized> LendingClient<L> {
    pub fn new(
        ledger: Arc<L>,
        config: &ClientConfig,
        mirror: Option<Arc<dyn Mirror>>,
    ) -> Result<Self, ConfigError> {
        let program_id = config.program_id()?;
        let mut bridge =
            SettlementBridge::new(ledger.clone()).with_poll_interval(config.poll_interval());
        if let Some(mirror) = mirror {
            bridge = bridge.with_mirror(mirror);
        }
        Ok(Self {
            builder: TransactionBuilder::new(ledger.clone(), program_id),
            ledger,
            bridge,
            confirm_timeout: config.confirm_timeout(),
        })
    }

    pub fn builder(&self) -> &TransactionBuilder<L> {
        &self.builder
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn program_id(&self) -> Pubkey {
        self.builder.program_id()
    }

    pub async fn settle(&self, built: &BuiltTransaction) -> Result<Signature, SettlementError> {
        self.bridge.settle(built, self.confirm_timeout).await
    }

    pub async fn initialize(&self, payer: &Pubkey) -> Result<Signature, SettlementError> {
        self.settle(&self.builder.initialize(payer)).await
    }

    pub async fn initialize_borrower_profile(
        &self,
        borrower: &Pubkey,
    ) -> Result<Signature, SettlementError> {
        self.settle(&self.builder.initialize_borrower_profile(borrower))
            .await
    }

    pub async fn create_offer(
        &self,
        lender: &Pubkey,
        params: &OfferParams,
    ) -> Result<Signature, SettlementError> {
        let built = self.builder.create_offer(lender, params).await?;
        self.settle(&built).await
    }

    pub async fn deposit_collateral(
        &self,
        borrower: &Pubkey,
        params: &CollateralParams,
    ) -> Result<Signature, SettlementError> {
        let built = self.builder.deposit_collateral(borrower, params).await?;
        self.settle(&built).await
    }

    pub async fn accept_offer(
        &self,
        borrower: &Pubkey,
        offer_address: &str,
    ) -> Result<Signature, SettlementError> {
        let built = self.builder.accept_offer(borrower, offer_address).await?;
        self.settle(&built).await
    }

    pub async fn repay_loan(
        &self,
        borrower: &Pubkey,
        offer_address: &str,
    ) -> Result<Signature, SettlementError> {
        let built = self.builder.repay_loan(borrower, offer_address).await?;
        self.settle(&built).await
    }

    // ------------------------------------------------------------------------
    // Re-query helpers, e.g. after a timed-out settlement
    // ------------------------------------------------------------------------

    pub async fn fetch_offer(
        &self,
        lender: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<LoanOffer>, ClientError> {
        let (address, _) = pda::offer_address(lender, mint, &self.program_id());
        ledger::fetch_account(&*self.ledger, &address).await
    }

    pub async fn fetch_offer_at(&self, offer_address: &str) -> Result<Option<LoanOffer>, ClientError> {
        let address = pda::parse_pubkey(offer_address)?;
        ledger::fetch_account(&*self.ledger, &address).await
    }

    pub async fn fetch_loan(
        &self,
        offer: &Pubkey,
        borrower: &Pubkey,
    ) -> Result<Option<Loan>, ClientError> {
        let (address, _) = pda::loan_address(offer, borrower, &self.program_id());
        ledger::fetch_account(&*self.ledger, &address).await
    }

    pub async fn fetch_obligation(&self, borrower: &Pubkey) -> Result<Option<Obligation>, ClientError> {
        let (address, _) = pda::obligation_address(borrower, &self.program_id());
        ledger::fetch_account(&*self.ledger, &address).await
    }

    pub async fn fetch_borrower_profile(
        &self,
        borrower: &Pubkey,
    ) -> Result<Option<BorrowerProfile>, ClientError> {
        let (address, _) = pda::borrower_profile_address(borrower, &self.program_id());
        ledger::fetch_account(&*self.ledger, &address).await
    }
}
