//! Turns user-level requests into program instructions.
//!
//! The builder catches the mistakes it can see locally (malformed addresses,
//! bad amounts, missing token accounts, short balances). The program remains
//! the authority on everything else.

use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::{system_program, InstructionData, ToAccountMetas};
use peer_lending::error::LendingError;
use peer_lending::state::{Loan, LoanOffer, Obligation, OfferTerms};
use peer_lending::{accounts, instruction as ix};

use crate::error::ClientError;
use crate::ledger::{require_account, Ledger, TokenHolding};
use crate::pda::{self, parse_pubkey};
use crate::tokens::{days_to_seconds, percent_to_bps, to_base_units, TokenRegistry};

/// Offer terms as a lender enters them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferParams {
    pub token_mint: String,
    /// Decimal amount in whole tokens, e.g. "1.5"
    pub amount: String,
    /// Flat interest for the term, as a percentage, e.g. "5"
    pub interest_rate_percent: String,
    /// Term in days, fractions allowed
    pub duration_days: String,
    pub min_score: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollateralParams {
    pub collateral_mint: String,
    /// Decimal amount in whole tokens
    pub amount: String,
}

/// What a transaction is meant to do, kept for the off-chain mirror
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Initialize,
    InitializeBorrowerProfile {
        borrower: Pubkey,
    },
    CreateOffer {
        offer: Pubkey,
        lender: Pubkey,
        token_mint: Pubkey,
        decimals: u8,
        terms: OfferTerms,
    },
    DepositCollateral {
        obligation: Pubkey,
        borrower: Pubkey,
        collateral_mint: Pubkey,
        decimals: u8,
        amount: u64,
    },
    AcceptLoan {
        offer: Pubkey,
        loan: Pubkey,
        lender: Pubkey,
        borrower: Pubkey,
        principal: u64,
    },
    RepayLoan {
        offer: Pubkey,
        loan: Pubkey,
        borrower: Pubkey,
        amount_due: u64,
    },
}

/// Instructions ready to sign, plus what they are for
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltTransaction {
    pub instructions: Vec<Instruction>,
    pub payer: Pubkey,
    pub intent: Intent,
}

pub struct TransactionBuilder<L: ?Sized> {
    ledger: Arc<L>,
    program_id: Pubkey,
    tokens: TokenRegistry,
}

impl<L: Ledger + ?Sized> TransactionBuilder<L> {
    pub fn new(ledger: Arc<L>, program_id: Pubkey) -> Self {
        Self {
            ledger,
            program_id,
            tokens: TokenRegistry::with_known_tokens(),
        }
    }

    pub fn with_tokens(mut self, tokens: TokenRegistry) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// The owner's best-funded account for `mint`
    async fn token_account(&self, owner: &Pubkey, mint: &Pubkey) -> Result<TokenHolding, ClientError> {
        self.ledger
            .token_accounts_by_owner(owner, mint)
            .await?
            .into_iter()
            .max_by_key(|holding| holding.amount)
            .ok_or(ClientError::NoTokenAccount {
                owner: *owner,
                mint: *mint,
            })
    }

    async fn funded_account(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
        required: u64,
    ) -> Result<TokenHolding, ClientError> {
        let holding = self.token_account(owner, mint).await?;
        if holding.amount < required {
            return Err(ClientError::InsufficientBalance {
                required,
                available: holding.amount,
            });
        }
        Ok(holding)
    }

    fn instruction(&self, accounts: impl ToAccountMetas, data: impl InstructionData) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: accounts.to_account_metas(None),
            data: data.data(),
        }
    }

    pub fn initialize(&self, payer: &Pubkey) -> BuiltTransaction {
        BuiltTransaction {
            instructions: vec![self.instruction(accounts::Initialize {}, ix::Initialize {})],
            payer: *payer,
            intent: Intent::Initialize,
        }
    }

    pub fn initialize_borrower_profile(&self, borrower: &Pubkey) -> BuiltTransaction {
        let (borrower_profile, _) = pda::borrower_profile_address(borrower, &self.program_id);
        let instruction = self.instruction(
            accounts::InitializeBorrowerProfile {
                borrower: *borrower,
                borrower_profile,
                system_program: system_program::ID,
            },
            ix::InitializeBorrowerProfile {},
        );
        BuiltTransaction {
            instructions: vec![instruction],
            payer: *borrower,
            intent: Intent::InitializeBorrowerProfile {
                borrower: *borrower,
            },
        }
    }

    pub async fn create_offer(
        &self,
        lender: &Pubkey,
        params: &OfferParams,
    ) -> Result<BuiltTransaction, ClientError> {
        let token_mint = parse_pubkey(&params.token_mint)?;
        let decimals = self.tokens.decimals(&*self.ledger, &token_mint).await?;
        let terms = OfferTerms {
            amount: to_base_units(&params.amount, decimals)?,
            interest_rate_bps: percent_to_bps(&params.interest_rate_percent)?,
            duration_seconds: days_to_seconds(&params.duration_days)?,
            min_score: params.min_score,
        };
        terms.validate().map_err(|e| {
            ClientError::InvalidTerms(
                LendingError::from_anchor(&e).unwrap_or(LendingError::InvalidAmount),
            )
        })?;

        let source = self.funded_account(lender, &token_mint, terms.amount).await?;
        let (offer, _) = pda::offer_address(lender, &token_mint, &self.program_id);
        let (vault, _) = pda::vault_address(&offer, &self.program_id);

        let instruction = self.instruction(
            accounts::CreateOffer {
                lender: *lender,
                loan_offer: offer,
                vault,
                lender_token_account: source.address,
                token_mint,
                token_program: anchor_spl::token::ID,
                system_program: system_program::ID,
            },
            ix::CreateOffer {
                amount: terms.amount,
                interest_rate_bps: terms.interest_rate_bps,
                duration_seconds: terms.duration_seconds,
                min_score: terms.min_score,
            },
        );

        Ok(BuiltTransaction {
            instructions: vec![instruction],
            payer: *lender,
            intent: Intent::CreateOffer {
                offer,
                lender: *lender,
                token_mint,
                decimals,
                terms,
            },
        })
    }

    /// CreateObligation: first deposit or top-up
    pub async fn deposit_collateral(
        &self,
        borrower: &Pubkey,
        params: &CollateralParams,
    ) -> Result<BuiltTransaction, ClientError> {
        let collateral_mint = parse_pubkey(&params.collateral_mint)?;
        let decimals = self.tokens.decimals(&*self.ledger, &collateral_mint).await?;
        let amount = to_base_units(&params.amount, decimals)?;
        let source = self.funded_account(borrower, &collateral_mint, amount).await?;

        let (obligation, _) = pda::obligation_address(borrower, &self.program_id);
        let (collateral_vault, _) =
            pda::collateral_vault_address(borrower, &collateral_mint, &self.program_id);

        let instruction = self.instruction(
            accounts::CreateObligation {
                borrower: *borrower,
                obligation,
                collateral_vault,
                borrower_collateral_account: source.address,
                collateral_mint,
                token_program: anchor_spl::token::ID,
                system_program: system_program::ID,
            },
            ix::CreateObligation {
                deposit_amount: amount,
            },
        );

        Ok(BuiltTransaction {
            instructions: vec![instruction],
            payer: *borrower,
            intent: Intent::DepositCollateral {
                obligation,
                borrower: *borrower,
                collateral_mint,
                decimals,
                amount,
            },
        })
    }

    pub async fn accept_offer(
        &self,
        borrower: &Pubkey,
        offer_address: &str,
    ) -> Result<BuiltTransaction, ClientError> {
        let offer_key = parse_pubkey(offer_address)?;
        let offer: LoanOffer = require_account(&*self.ledger, &offer_key).await?;
        let destination = self.token_account(borrower, &offer.token_mint).await?;

        let (loan, _) = pda::loan_address(&offer_key, borrower, &self.program_id);
        let (obligation, _) = pda::obligation_address(borrower, &self.program_id);
        let (borrower_profile, _) = pda::borrower_profile_address(borrower, &self.program_id);

        let instruction = self.instruction(
            accounts::AcceptLoan {
                borrower: *borrower,
                loan_offer: offer_key,
                vault: offer.vault,
                loan,
                obligation,
                borrower_profile,
                borrower_token_account: destination.address,
                token_mint: offer.token_mint,
                token_program: anchor_spl::token::ID,
                system_program: system_program::ID,
            },
            ix::AcceptLoan {},
        );

        Ok(BuiltTransaction {
            instructions: vec![instruction],
            payer: *borrower,
            intent: Intent::AcceptLoan {
                offer: offer_key,
                loan,
                lender: offer.lender,
                borrower: *borrower,
                principal: offer.amount,
            },
        })
    }

    /// Repay the borrower's loan on `offer_address`. The program charges
    /// exactly the amount due; the instruction authorizes that amount.
    pub async fn repay_loan(
        &self,
        borrower: &Pubkey,
        offer_address: &str,
    ) -> Result<BuiltTransaction, ClientError> {
        let offer_key = parse_pubkey(offer_address)?;
        let offer: LoanOffer = require_account(&*self.ledger, &offer_key).await?;
        let (loan_key, _) = pda::loan_address(&offer_key, borrower, &self.program_id);
        let loan: Loan = require_account(&*self.ledger, &loan_key).await?;
        let (obligation_key, _) = pda::obligation_address(borrower, &self.program_id);
        let obligation: Obligation = require_account(&*self.ledger, &obligation_key).await?;

        let amount_due = loan
            .amount_due()
            .map_err(|_| ClientError::InvalidTerms(LendingError::MathOverflow))?;

        let source = self
            .funded_account(borrower, &offer.token_mint, amount_due)
            .await?;
        let lender_destination = self.token_account(&offer.lender, &offer.token_mint).await?;
        let collateral_destination = self
            .token_account(borrower, &obligation.collateral_token_mint)
            .await?;
        let (borrower_profile, _) = pda::borrower_profile_address(borrower, &self.program_id);

        let instruction = self.instruction(
            accounts::RepayLoan {
                borrower: *borrower,
                loan_offer: offer_key,
                loan: loan_key,
                obligation: obligation_key,
                borrower_profile,
                borrower_token_account: source.address,
                lender_token_account: lender_destination.address,
                collateral_vault: obligation.collateral_account,
                borrower_collateral_account: collateral_destination.address,
                token_program: anchor_spl::token::ID,
            },
            ix::RepayLoan {
                repayment_amount: amount_due,
            },
        );

        Ok(BuiltTransaction {
            instructions: vec![instruction],
            payer: *borrower,
            intent: Intent::RepayLoan {
                offer: offer_key,
                loan: loan_key,
                borrower: *borrower,
                amount_due,
            },
        })
    }
}
