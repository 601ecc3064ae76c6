//! The OP-Stack L1 contract surface this crate reads.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::sol;

sol! {
    /// `OptimismPortal` subset: versioning, the respected game type, and
    /// proven-withdrawal bookkeeping.
    #[allow(missing_docs)]
    interface IOptimismPortal {
        function version() external view returns (string);
        function respectedGameType() external view returns (uint32);
        function provenWithdrawals(bytes32 withdrawalHash) external view returns (bytes32 outputRoot, uint128 timestamp, uint128 l2OutputIndex);
        function proofMaturityDelaySeconds() external view returns (uint256);
    }

    /// `DisputeGameFactory` subset used for fault-proof lookups.
    #[allow(missing_docs)]
    interface IDisputeGameFactory {
        struct GameSearchResult {
            uint256 index;
            bytes32 metadata;
            uint64 timestamp;
            bytes32 rootClaim;
            bytes extraData;
        }

        function gameCount() external view returns (uint256);
        function findLatestGames(uint32 gameType, uint256 start, uint256 n) external view returns (GameSearchResult[] memory games);
    }

    /// Legacy `L2OutputOracle` subset.
    #[allow(missing_docs)]
    interface IL2OutputOracle {
        struct OutputProposal {
            bytes32 outputRoot;
            uint128 timestamp;
            uint128 l2BlockNumber;
        }

        function latestBlockNumber() external view returns (uint256);
        function getL2OutputIndexAfter(uint256 l2BlockNumber) external view returns (uint256);
        function getL2Output(uint256 l2OutputIndex) external view returns (OutputProposal memory);
        function FINALIZATION_PERIOD_SECONDS() external view returns (uint256);
        function SUBMISSION_INTERVAL() external view returns (uint256);
        function L2_BLOCK_TIME() external view returns (uint256);
    }

    /// Emitted by the `L2ToL1MessagePasser` for every withdrawal.
    #[allow(missing_docs)]
    event MessagePassed(
        uint256 indexed nonce,
        address indexed sender,
        address indexed target,
        uint256 value,
        uint256 gasLimit,
        bytes data,
        bytes32 withdrawalHash
    );
}

/// Unpacks a factory `GameId`: 4 bytes of game type, 8 bytes of creation
/// timestamp, 20 bytes of proxy address.
#[must_use]
pub fn unpack_game_metadata(metadata: B256) -> (u32, u64, Address) {
    let bytes = metadata.as_slice();
    let mut game_type = [0u8; 4];
    game_type.copy_from_slice(&bytes[0..4]);
    let mut created_at = [0u8; 8];
    created_at.copy_from_slice(&bytes[4..12]);
    let proxy = Address::from_slice(&bytes[12..32]);
    (
        u32::from_be_bytes(game_type),
        u64::from_be_bytes(created_at),
        proxy,
    )
}

/// Reads the L2 block number a game covers off its `extraData` (the first
/// 32-byte word).
#[must_use]
pub fn game_l2_block_number(extra_data: &[u8]) -> u64 {
    if extra_data.len() < 32 {
        return 0;
    }
    U256::from_be_slice(&extra_data[0..32]).saturating_to()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn game_metadata_unpacks_its_three_fields() {
        let proxy = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
        let mut packed = [0u8; 32];
        packed[0..4].copy_from_slice(&1u32.to_be_bytes());
        packed[4..12].copy_from_slice(&1_700_000_000u64.to_be_bytes());
        packed[12..32].copy_from_slice(proxy.as_slice());

        let (game_type, created_at, unpacked_proxy) = unpack_game_metadata(B256::from(packed));
        assert_eq!(game_type, 1);
        assert_eq!(created_at, 1_700_000_000);
        assert_eq!(unpacked_proxy, proxy);
    }

    #[test]
    fn extra_data_carries_the_covered_block() {
        let mut extra = [0u8; 32];
        extra[24..32].copy_from_slice(&42u64.to_be_bytes());
        assert_eq!(game_l2_block_number(&extra), 42);
        assert_eq!(game_l2_block_number(&[]), 0);
    }
}
