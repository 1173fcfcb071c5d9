#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use peer_lending_client::{
    pda, ClientConfig, CollateralParams, InMemoryLedger, LendingClient, Mirror, MirrorError,
    MirrorUpdate, OfferParams,
};

pub const T0: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;

/// Both test mints use 6 decimals, so "1" is 1_000_000 base units
pub const DECIMALS: u8 = 6;

pub struct Participant {
    pub wallet: Pubkey,
    pub loan_tokens: Pubkey,
    pub collateral_tokens: Pubkey,
}

pub struct Market {
    pub ledger: Arc<InMemoryLedger>,
    pub client: Arc<LendingClient<InMemoryLedger>>,
    pub loan_mint: Pubkey,
    pub collateral_mint: Pubkey,
    pub lender: Participant,
    pub borrower: Participant,
}

pub fn config() -> ClientConfig {
    ClientConfig {
        mirror_url: None,
        confirm_timeout_ms: 2_000,
        poll_interval_ms: 1,
        ..ClientConfig::default()
    }
}

pub fn market() -> Market {
    market_with_mirror(None)
}

pub fn market_with_mirror(mirror: Option<Arc<dyn Mirror>>) -> Market {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.set_clock(T0);
    let loan_mint = ledger.create_mint(DECIMALS);
    let collateral_mint = ledger.create_mint(DECIMALS);

    let client = Arc::new(
        LendingClient::new(ledger.clone(), &config(), mirror).expect("default config is valid"),
    );

    let mut market = Market {
        lender: Participant {
            wallet: Pubkey::new_unique(),
            loan_tokens: Pubkey::default(),
            collateral_tokens: Pubkey::default(),
        },
        borrower: Participant {
            wallet: Pubkey::new_unique(),
            loan_tokens: Pubkey::default(),
            collateral_tokens: Pubkey::default(),
        },
        ledger,
        client,
        loan_mint,
        collateral_mint,
    };
    market.lender = market.participant(5_000_000, 0);
    market.borrower = market.participant(2_000_000, 1_000_000);
    market
}

impl Market {
    /// A fresh wallet holding the given balances of both mints
    pub fn participant(&self, loan_amount: u64, collateral_amount: u64) -> Participant {
        let wallet = Pubkey::new_unique();
        Participant {
            wallet,
            loan_tokens: self
                .ledger
                .create_token_account(wallet, self.loan_mint, loan_amount),
            collateral_tokens: self.ledger.create_token_account(
                wallet,
                self.collateral_mint,
                collateral_amount,
            ),
        }
    }

    /// 1 token at 5% for 30 days, min score 500
    pub fn standard_offer(&self) -> OfferParams {
        OfferParams {
            token_mint: self.loan_mint.to_string(),
            amount: "1".to_string(),
            interest_rate_percent: "5".to_string(),
            duration_days: "30".to_string(),
            min_score: 500,
        }
    }

    pub fn collateral(&self, amount: &str) -> CollateralParams {
        CollateralParams {
            collateral_mint: self.collateral_mint.to_string(),
            amount: amount.to_string(),
        }
    }

    pub fn offer_address(&self, lender: &Pubkey) -> Pubkey {
        pda::offer_address(lender, &self.loan_mint, &self.client.program_id()).0
    }

    pub fn vault_address(&self, lender: &Pubkey) -> Pubkey {
        pda::vault_address(&self.offer_address(lender), &self.client.program_id()).0
    }

    pub fn collateral_vault_address(&self, borrower: &Pubkey) -> Pubkey {
        pda::collateral_vault_address(borrower, &self.collateral_mint, &self.client.program_id()).0
    }

    pub fn balance(&self, account: &Pubkey) -> u64 {
        self.ledger.token_balance(account).unwrap_or_default()
    }

    /// Post the standard offer from the market's lender
    pub async fn open_offer(&self) -> Pubkey {
        self.client
            .create_offer(&self.lender.wallet, &self.standard_offer())
            .await
            .expect("offer opens");
        self.offer_address(&self.lender.wallet)
    }

    /// Collateralize `borrower` and give them `score`
    pub async fn ready_borrower(&self, borrower: &Participant, score: u64) {
        self.client
            .deposit_collateral(&borrower.wallet, &self.collateral("0.5"))
            .await
            .expect("collateral deposits");
        self.ledger.set_borrower_score(&borrower.wallet, score);
    }
}

/// Mirror that remembers what it was told, optionally failing every call
#[derive(Default)]
pub struct RecordingMirror {
    pub updates: Mutex<Vec<MirrorUpdate>>,
    pub fail: bool,
}

impl RecordingMirror {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<MirrorUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Wait for the spawned mirror tasks to deliver `count` updates
    pub async fn wait_for(&self, count: usize) -> Vec<MirrorUpdate> {
        for _ in 0..200 {
            let recorded = self.recorded();
            if recorded.len() >= count {
                return recorded;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.recorded()
    }
}

#[async_trait]
impl Mirror for RecordingMirror {
    async fn record(&self, update: &MirrorUpdate) -> Result<(), MirrorError> {
        self.updates.lock().unwrap().push(update.clone());
        if self.fail {
            return Err(MirrorError::Status {
                status: 503,
                message: "mirror unavailable".to_string(),
            });
        }
        Ok(())
    }
}
