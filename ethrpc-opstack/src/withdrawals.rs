//! Withdrawal extraction and proving/finalization timings.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use ethrpc::{ProviderError, Transport};

use crate::OpStack;
use crate::contracts::{IL2OutputOracle, IOptimismPortal, MessagePassed};
use crate::error::OpStackError;

/// One `MessagePassed` withdrawal extracted from an L2 receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    /// Message-passer nonce.
    pub nonce: U256,
    /// L2 sender.
    pub sender: Address,
    /// L1 target.
    pub target: Address,
    /// Transferred wei.
    pub value: U256,
    /// Gas limit forwarded to the target.
    pub gas_limit: U256,
    /// Forwarded calldata.
    pub data: Bytes,
    /// The withdrawal hash proven on L1.
    pub withdrawal_hash: B256,
}

/// Proving record of a withdrawal on the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenWithdrawal {
    /// The output root the proof was made against.
    pub output_root: B256,
    /// When the proof landed (seconds).
    pub timestamp: u128,
    /// The output index the proof was made against.
    pub l2_output_index: u128,
}

impl<T: Transport> OpStack<'_, T> {
    /// Extracts every withdrawal message out of the receipt of `tx_hash`.
    ///
    /// # Errors
    ///
    /// [`OpStackError::InvalidWithdrawalHash`] when the receipt emitted no
    /// `MessagePassed` logs.
    pub async fn get_withdrawal_messages(
        &self,
        tx_hash: B256,
    ) -> Result<Vec<Withdrawal>, OpStackError> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        let withdrawals = withdrawals_from_logs(receipt.inner.logs())?;
        if withdrawals.is_empty() {
            return Err(OpStackError::InvalidWithdrawalHash);
        }
        Ok(withdrawals)
    }

    /// The portal's proving record for `withdrawal_hash`.
    ///
    /// # Errors
    ///
    /// [`OpStackError::WithdrawalNotProved`] when no proof has landed.
    pub async fn get_proven_withdrawal(
        &self,
        withdrawal_hash: B256,
    ) -> Result<ProvenWithdrawal, OpStackError> {
        let proven = self
            .read(
                self.contracts().portal,
                IOptimismPortal::provenWithdrawalsCall {
                    withdrawalHash: withdrawal_hash,
                },
            )
            .await?;
        if proven.timestamp == 0 {
            return Err(OpStackError::WithdrawalNotProved);
        }
        Ok(ProvenWithdrawal {
            output_root: proven.outputRoot,
            timestamp: proven.timestamp,
            l2_output_index: proven.l2OutputIndex,
        })
    }

    /// Seconds until a proven withdrawal becomes finalizable: the proof
    /// timestamp plus the proof maturity delay (fault proofs) or the
    /// oracle's finalization period (legacy), minus now. Floors at zero.
    pub async fn get_seconds_to_finalize(
        &self,
        withdrawal_hash: B256,
    ) -> Result<u64, OpStackError> {
        let proven = self.get_proven_withdrawal(withdrawal_hash).await?;
        let period: U256 = if self.fault_proofs_enabled().await? {
            self.read(
                self.contracts().portal,
                IOptimismPortal::proofMaturityDelaySecondsCall {},
            )
            .await?
        } else {
            self.read(
                self.contracts().l2_output_oracle,
                IL2OutputOracle::FINALIZATION_PERIOD_SECONDSCall {},
            )
            .await?
        };

        let finalize_at = proven.timestamp.saturating_add(period.saturating_to());
        Ok(seconds_until(finalize_at, u128::from(unix_now())))
    }

    /// Seconds until the oracle posts an output covering `latest_l2_block`.
    ///
    /// Mirrors the oracle's historical behavior: a block older than the
    /// oracle's latest posted block is rejected with
    /// [`ProviderError::InvalidBlockNumber`], so historical queries must go
    /// through [`OpStack::get_l2_output`] instead.
    pub async fn get_seconds_to_next_l2_output(
        &self,
        latest_l2_block: u64,
    ) -> Result<u64, OpStackError> {
        let oracle = self.contracts().l2_output_oracle;
        let posted: U256 = self
            .read(oracle, IL2OutputOracle::latestBlockNumberCall {})
            .await?;
        let posted: u64 = posted.saturating_to();
        if latest_l2_block < posted {
            return Err(OpStackError::Provider(ProviderError::InvalidBlockNumber));
        }

        let interval: U256 = self
            .read(oracle, IL2OutputOracle::SUBMISSION_INTERVALCall {})
            .await?;
        let block_time: U256 = self
            .read(oracle, IL2OutputOracle::L2_BLOCK_TIMECall {})
            .await?;
        Ok(seconds_to_next_output(
            latest_l2_block,
            posted,
            interval.saturating_to(),
            block_time.saturating_to(),
        ))
    }
}

/// Decodes every `MessagePassed` log in `logs`.
pub(crate) fn withdrawals_from_logs(logs: &[Log]) -> Result<Vec<Withdrawal>, OpStackError> {
    let mut withdrawals = Vec::new();
    for log in logs {
        if log.inner.data.topics().first() != Some(&MessagePassed::SIGNATURE_HASH) {
            continue;
        }
        let event = MessagePassed::decode_log_data(&log.inner.data)?;
        withdrawals.push(Withdrawal {
            nonce: event.nonce,
            sender: event.sender,
            target: event.target,
            value: event.value,
            gas_limit: event.gasLimit,
            data: event.data,
            withdrawal_hash: event.withdrawalHash,
        });
    }
    Ok(withdrawals)
}

/// Blocks remaining to the next output window, in seconds.
pub(crate) fn seconds_to_next_output(
    latest_l2_block: u64,
    posted_block: u64,
    submission_interval: u64,
    l2_block_time: u64,
) -> u64 {
    let next_output_block = posted_block.saturating_add(submission_interval);
    next_output_block
        .saturating_sub(latest_l2_block)
        .saturating_mul(l2_block_time)
}

fn seconds_until(deadline: u128, now: u128) -> u64 {
    u64::try_from(deadline.saturating_sub(now)).unwrap_or(u64::MAX)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
