//! Dispute-game listing, selection, and cadence projection.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256, U256};
use ethrpc::Transport;

use crate::contracts::{
    IDisputeGameFactory, IL2OutputOracle, IOptimismPortal, game_l2_block_number,
    unpack_game_metadata,
};
use crate::error::OpStackError;
use crate::{GAME_CADENCE_SAMPLE, OpStack};

/// One dispute game as listed by the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeGame {
    /// Factory index.
    pub index: U256,
    /// Game type as packed in the factory metadata.
    pub game_type: u32,
    /// Creation timestamp (seconds).
    pub timestamp: u64,
    /// The claimed output root.
    pub root_claim: B256,
    /// The L2 block the claim covers.
    pub l2_block_number: u64,
    /// The game proxy contract.
    pub proxy: Address,
}

/// How [`OpStack::get_game`] picks among candidate games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStrategy {
    /// The newest candidate.
    Latest,
    /// The oldest candidate.
    Oldest,
    /// A deterministic pick seeded by `block_number · limit`.
    Random,
}

/// An L2 output proposal, from either proving generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2Output {
    /// Oracle index or game index.
    pub output_index: u64,
    /// The output root.
    pub output_root: B256,
    /// Proposal timestamp (seconds).
    pub timestamp: u128,
    /// The L2 block the output covers.
    pub l2_block_number: u128,
}

impl<T: Transport> OpStack<'_, T> {
    /// Lists up to `limit` games, newest first, optionally keeping only
    /// games covering `at_or_past_block` or later.
    ///
    /// # Errors
    ///
    /// [`OpStackError::FaultProofsNotEnabled`] on a pre-fault-proof portal.
    pub async fn get_games(
        &self,
        limit: u64,
        at_or_past_block: Option<u64>,
    ) -> Result<Vec<DisputeGame>, OpStackError> {
        if !self.fault_proofs_enabled().await? {
            return Err(OpStackError::FaultProofsNotEnabled);
        }

        let game_type = self
            .read(
                self.contracts().portal,
                IOptimismPortal::respectedGameTypeCall {},
            )
            .await?;
        let count: U256 = self
            .read(
                self.contracts().dispute_game_factory,
                IDisputeGameFactory::gameCountCall {},
            )
            .await?;
        if count.is_zero() {
            return Ok(Vec::new());
        }

        let results = self
            .read(
                self.contracts().dispute_game_factory,
                IDisputeGameFactory::findLatestGamesCall {
                    gameType: game_type,
                    start: count - U256::from(1u64),
                    n: U256::from(limit).min(count),
                },
            )
            .await?;

        let mut games: Vec<DisputeGame> = results.into_iter().map(parse_game).collect();
        if let Some(filter) = at_or_past_block {
            games.retain(|game| game.l2_block_number >= filter);
        }
        games.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(games)
    }

    /// Picks one game covering `block_number` from the latest `limit`
    /// games.
    pub async fn get_game(
        &self,
        limit: u64,
        block_number: u64,
        strategy: GameStrategy,
    ) -> Result<DisputeGame, OpStackError> {
        let games = self.get_games(limit, Some(block_number)).await?;
        select_game(&games, strategy, block_number, limit).ok_or(OpStackError::GameNotFound)
    }

    /// The output proposal covering `l2_block_number`, read from games when
    /// fault proofs are live and from the output oracle otherwise.
    pub async fn get_l2_output(&self, l2_block_number: u64) -> Result<L2Output, OpStackError> {
        if self.fault_proofs_enabled().await? {
            let game = self
                .get_game(GAME_CADENCE_SAMPLE, l2_block_number, GameStrategy::Latest)
                .await?;
            return Ok(L2Output {
                output_index: game.index.saturating_to(),
                output_root: game.root_claim,
                timestamp: u128::from(game.timestamp),
                l2_block_number: u128::from(game.l2_block_number),
            });
        }

        let oracle = self.contracts().l2_output_oracle;
        let index: U256 = self
            .read(
                oracle,
                IL2OutputOracle::getL2OutputIndexAfterCall {
                    l2BlockNumber: U256::from(l2_block_number),
                },
            )
            .await?;
        let proposal = self
            .read(
                oracle,
                IL2OutputOracle::getL2OutputCall {
                    l2OutputIndex: index,
                },
            )
            .await?;
        Ok(L2Output {
            output_index: index.saturating_to(),
            output_root: proposal.outputRoot,
            timestamp: proposal.timestamp,
            l2_block_number: proposal.l2BlockNumber,
        })
    }

    /// Projects how long until a game covering `l2_block` is expected,
    /// fitting the average inter-game interval over the last
    /// [`GAME_CADENCE_SAMPLE`] games and scaling it by `interval_buffer`.
    pub async fn get_seconds_to_next_game(
        &self,
        interval_buffer: f64,
        l2_block: u64,
    ) -> Result<u64, OpStackError> {
        let games = self.get_games(GAME_CADENCE_SAMPLE, None).await?;
        project_next_game(&games, interval_buffer, l2_block, unix_now())
            .ok_or(OpStackError::GameNotFound)
    }
}

fn parse_game(result: IDisputeGameFactory::GameSearchResult) -> DisputeGame {
    let (game_type, _, proxy) = unpack_game_metadata(result.metadata);
    DisputeGame {
        index: result.index,
        game_type,
        timestamp: result.timestamp,
        root_claim: result.rootClaim,
        l2_block_number: game_l2_block_number(&result.extraData),
        proxy,
    }
}

/// Picks a game from `games` (newest first) per the strategy; `Random` is
/// seeded by `block_number · limit` so repeated queries agree.
pub(crate) fn select_game(
    games: &[DisputeGame],
    strategy: GameStrategy,
    block_number: u64,
    limit: u64,
) -> Option<DisputeGame> {
    if games.is_empty() {
        return None;
    }
    match strategy {
        GameStrategy::Latest => games.first().cloned(),
        GameStrategy::Oldest => games.last().cloned(),
        GameStrategy::Random => {
            let seed = block_number.wrapping_mul(limit);
            games.get((seed % games.len() as u64) as usize).cloned()
        }
    }
}

/// Pure cadence projection over `games` (newest first) at `now`.
pub(crate) fn project_next_game(
    games: &[DisputeGame],
    interval_buffer: f64,
    l2_block: u64,
    now: u64,
) -> Option<u64> {
    let latest = games.first()?;
    if l2_block <= latest.l2_block_number {
        return Some(0);
    }

    let mut interval_sum = 0.0f64;
    let mut span_sum = 0.0f64;
    let mut samples = 0.0f64;
    for pair in games.windows(2) {
        interval_sum += pair[0].timestamp.saturating_sub(pair[1].timestamp) as f64;
        span_sum += pair[0]
            .l2_block_number
            .saturating_sub(pair[1].l2_block_number) as f64;
        samples += 1.0;
    }
    if samples == 0.0 {
        return Some(0);
    }

    let scaled_interval = (interval_sum / samples) * interval_buffer;
    let blocks_per_game = (span_sum / samples).max(1.0);
    let intervals_needed = ((l2_block - latest.l2_block_number) as f64 / blocks_per_game).ceil();
    let eta = latest.timestamp as f64 + intervals_needed * scaled_interval;
    Some((eta - now as f64).max(0.0) as u64)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
