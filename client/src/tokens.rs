//! Known mints and decimal <-> base-unit conversion.

use std::collections::HashMap;
use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use peer_lending::constants::SECONDS_PER_DAY;
use peer_lending::error::LendingError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ClientError;
use crate::ledger::Ledger;

// ============================================================================
// KNOWN MINTS
// ============================================================================

pub const BONK_MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDC_DEVNET_MINT: &str = "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// (symbol, mint, decimals). BONK, USDT and wrapped SOL share one address
/// across mainnet and devnet.
const KNOWN_TOKENS: &[(&str, &str, u8)] = &[
    ("BONK", BONK_MINT, 5),
    ("USDC", USDC_MINT, 6),
    ("USDC", USDC_DEVNET_MINT, 6),
    ("USDT", USDT_MINT, 6),
    ("SOL", WRAPPED_SOL_MINT, 9),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Mint metadata known without touching the ledger
#[derive(Clone, Debug, Default)]
pub struct TokenRegistry {
    tokens: HashMap<Pubkey, TokenInfo>,
}

impl TokenRegistry {
    pub fn with_known_tokens() -> Self {
        let mut registry = Self::default();
        for (symbol, mint, decimals) in KNOWN_TOKENS {
            // Constant addresses, always valid base58
            if let Ok(mint) = Pubkey::from_str(mint) {
                registry.register(mint, symbol, *decimals);
            }
        }
        registry
    }

    pub fn register(&mut self, mint: Pubkey, symbol: &str, decimals: u8) {
        self.tokens.insert(
            mint,
            TokenInfo {
                symbol: symbol.to_string(),
                decimals,
            },
        );
    }

    pub fn get(&self, mint: &Pubkey) -> Option<&TokenInfo> {
        self.tokens.get(mint)
    }

    /// Ticker for display; unknown mints show their first four characters
    pub fn symbol(&self, mint: &Pubkey) -> String {
        match self.tokens.get(mint) {
            Some(info) => info.symbol.clone(),
            None => {
                let address = mint.to_string();
                format!("{}...", &address[..4.min(address.len())])
            }
        }
    }

    /// Registry first, then the mint account on the ledger
    pub async fn decimals<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        mint: &Pubkey,
    ) -> Result<u8, ClientError> {
        if let Some(info) = self.tokens.get(mint) {
            return Ok(info.decimals);
        }
        Ok(ledger.mint_decimals(mint).await?)
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

fn parse_decimal(input: &str) -> Result<Decimal, ClientError> {
    Decimal::from_str(input.trim())
        .map_err(|e| ClientError::InvalidAmount(format!("{input:?}: {e}")))
}

/// Convert a user-entered decimal string to base units.
///
/// Rejects zero, negative, more fractional digits than the mint supports,
/// and anything that does not fit in a u64.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<u64, ClientError> {
    let value = parse_decimal(amount)?;
    if value <= Decimal::ZERO {
        return Err(ClientError::InvalidAmount(format!(
            "{amount:?} must be greater than zero"
        )));
    }
    if value.normalize().scale() > u32::from(decimals) {
        return Err(ClientError::InvalidAmount(format!(
            "{amount:?} has more than {decimals} decimal places"
        )));
    }

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| ClientError::InvalidAmount(format!("unsupported decimals {decimals}")))?;

    value
        .checked_mul(Decimal::from(scale))
        .and_then(|base| base.to_u64())
        .ok_or_else(|| ClientError::InvalidAmount(format!("{amount:?} is too large")))
}

/// Base units back to a display amount
pub fn to_ui_amount(base_units: u64, decimals: u8) -> Decimal {
    let mut value = Decimal::from(base_units);
    // Decimal supports at most 28 fractional digits; SPL mints use far fewer
    if value.set_scale(u32::from(decimals)).is_err() {
        return Decimal::from(base_units);
    }
    value.normalize()
}

/// Interest as a percentage ("5", "2.5") to basis points, rounded half away
/// from zero.
pub fn percent_to_bps(percent: &str) -> Result<u16, ClientError> {
    let invalid = || ClientError::InvalidTerms(LendingError::InvalidInterestRate);
    let value = Decimal::from_str(percent.trim()).map_err(|_| invalid())?;
    let bps = value
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(invalid)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u16()
        .ok_or_else(invalid)?;
    if bps == 0 {
        return Err(invalid());
    }
    Ok(bps)
}

/// Term in days (fractions allowed) to whole seconds, rounded down
pub fn days_to_seconds(days: &str) -> Result<u64, ClientError> {
    let invalid = || ClientError::InvalidTerms(LendingError::InvalidDuration);
    let value = Decimal::from_str(days.trim()).map_err(|_| invalid())?;
    let seconds = value
        .checked_mul(Decimal::from(SECONDS_PER_DAY))
        .ok_or_else(invalid)?
        .floor()
        .to_u64()
        .ok_or_else(invalid)?;
    // Deadlines are i64 timestamps on-chain
    if seconds == 0 || i64::try_from(seconds).is_err() {
        return Err(invalid());
    }
    Ok(seconds)
}
