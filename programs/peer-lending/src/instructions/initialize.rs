use anchor_lang::prelude::*;

/// No accounts; establishes program presence
#[derive(Accounts)]
pub struct Initialize {}

pub fn handler(ctx: Context<Initialize>) -> Result<()> {
    msg!("Peer lending program initialized: {:?}", ctx.program_id);
    Ok(())
}
