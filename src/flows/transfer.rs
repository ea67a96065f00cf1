// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token transfer from the signed-in user's wallet.
//!
//! Checks run in a fixed order and the first failure stops the flow:
//!
//! 1. recipient is a valid address
//! 2. recipient is not the sender (before any chain call)
//! 3. amount parses with the contract's `decimals` and fits the fresh balance
//!
//! Only then is the transfer submitted. Errors are reported as-is; nothing is
//! retried.

use alloy::primitives::{Address, TxHash};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::Session;
use crate::blockchain::{format_amount, parse_address, parse_amount, ChainError};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub to: &'a str,
    /// Human-readable amount, e.g. `"2.5"`
    pub amount: &'a str,
}

/// Progress reported while a transfer is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferProgress {
    /// Accepted by the node; waiting to be mined
    Submitted { tx_hash: TxHash },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub from: Address,
    pub to: Address,
    /// Amount as entered
    pub amount: String,
    pub symbol: String,
}

pub async fn send_tokens<F>(
    state: &AppState,
    session: &Session,
    request: &TransferRequest<'_>,
    on_progress: F,
) -> Result<TransferReceipt, AppError>
where
    F: FnMut(TransferProgress) + Send,
{
    let span = info_span!("transfer", flow_id = %Uuid::new_v4(), uid = %session.uid());
    send_tokens_inner(state, session, request, on_progress)
        .instrument(span)
        .await
}

async fn send_tokens_inner<F>(
    state: &AppState,
    session: &Session,
    request: &TransferRequest<'_>,
    mut on_progress: F,
) -> Result<TransferReceipt, AppError>
where
    F: FnMut(TransferProgress) + Send,
{
    let to = parse_address(request.to)?;

    let uid = session.uid();
    let record = state
        .store
        .get(uid)
        .await?
        .ok_or_else(|| AppError::RecordNotFound {
            uid: uid.to_string(),
        })?;
    let ledger = state.ledgers.connect(&record.private_key)?;
    let from = ledger.sender();

    if to == from {
        return Err(AppError::SelfTransfer);
    }

    let decimals = ledger.decimals().await?;
    let amount = parse_amount(request.amount, decimals)?;
    if amount.is_zero() {
        return Err(AppError::InvalidAmount(format!(
            "\"{}\" must be greater than zero",
            request.amount.trim()
        )));
    }

    let balance = ledger.balance_of(from).await?;
    if amount > balance {
        return Err(AppError::InsufficientBalance {
            balance: format_amount(balance, decimals),
            symbol: state.token.symbol.clone(),
        });
    }

    let tx_hash = ledger.submit_transfer(to, amount).await?;
    info!(tx_hash = %tx_hash, to = %to, amount = %request.amount, "Transfer submitted");
    on_progress(TransferProgress::Submitted { tx_hash });

    let receipt = ledger.wait_for_confirmation(tx_hash).await?;
    if !receipt.success {
        warn!(tx_hash = %tx_hash, block = receipt.block_number, "Transfer reverted");
        return Err(ChainError::TransactionFailed(format!(
            "transaction {tx_hash} reverted in block {}",
            receipt.block_number
        ))
        .into());
    }

    info!(tx_hash = %tx_hash, block = receipt.block_number, "Transfer confirmed");
    Ok(TransferReceipt {
        tx_hash,
        block_number: receipt.block_number,
        from,
        to,
        amount: request.amount.trim().to_string(),
        symbol: state.token.symbol.clone(),
    })
}
