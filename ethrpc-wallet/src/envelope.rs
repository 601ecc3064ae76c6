//! EIP-2718 transaction envelopes.
//!
//! The envelope sum type carries exactly the fields each kind needs;
//! preparation, assertion, and serialization all match exhaustively so a new
//! kind cannot silently bypass any of them. Wire serialization is delegated
//! to the consensus codec ([`alloy_consensus`]); this module owns the field
//! model and the conversions.

use alloy_consensus::{
    SignableTransaction, TxEip1559, TxEip2930, TxEip4844, TxEip4844Variant, TxEip7702, TxEnvelope,
    TxLegacy, TypedTransaction,
};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, B256, Bytes, Signature, TxKind, U256};

use crate::authorization::AuthorizationPayload;
use crate::error::WalletError;

/// EIP-2718 envelope discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Pre-2718 transaction (type byte `0x00` on the wire).
    Legacy,
    /// EIP-2930 access-list transaction (`0x01`).
    Berlin,
    /// EIP-1559 dynamic-fee transaction (`0x02`).
    London,
    /// EIP-4844 blob transaction (`0x03`).
    Cancun,
    /// EIP-7702 set-code transaction (`0x04`).
    Eip7702,
    /// OP-Stack deposit transaction (`0x7e`); recognized but not sendable.
    Deposit,
}

impl TransactionType {
    /// The EIP-2718 type byte.
    #[must_use]
    pub const fn type_byte(self) -> u8 {
        match self {
            Self::Legacy => 0x00,
            Self::Berlin => 0x01,
            Self::London => 0x02,
            Self::Cancun => 0x03,
            Self::Eip7702 => 0x04,
            Self::Deposit => 0x7e,
        }
    }

    /// Parses a type byte.
    ///
    /// # Errors
    ///
    /// [`WalletError::UnsupportedTransactionType`] for unknown discriminants.
    pub const fn from_type_byte(byte: u8) -> Result<Self, WalletError> {
        match byte {
            0x00 => Ok(Self::Legacy),
            0x01 => Ok(Self::Berlin),
            0x02 => Ok(Self::London),
            0x03 => Ok(Self::Cancun),
            0x04 => Ok(Self::Eip7702),
            0x7e => Ok(Self::Deposit),
            other => Err(WalletError::UnsupportedTransactionType(other)),
        }
    }
}

/// Pre-2718 envelope. `chain_id` zero means pre-EIP-155 signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEnvelope {
    /// Chain id, or zero for pre-EIP-155.
    pub chain_id: u64,
    /// Account nonce.
    pub nonce: u64,
    /// Destination, `None` for contract creation.
    pub to: Option<Address>,
    /// Transferred wei.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Gas limit.
    pub gas: u64,
    /// Gas price in wei.
    pub gas_price: u128,
}

/// EIP-2930 envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerlinEnvelope {
    /// Chain id.
    pub chain_id: u64,
    /// Account nonce.
    pub nonce: u64,
    /// Destination, `None` for contract creation.
    pub to: Option<Address>,
    /// Transferred wei.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Gas limit.
    pub gas: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Pre-warmed storage accesses.
    pub access_list: AccessList,
}

/// EIP-1559 envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LondonEnvelope {
    /// Chain id.
    pub chain_id: u64,
    /// Account nonce.
    pub nonce: u64,
    /// Destination, `None` for contract creation.
    pub to: Option<Address>,
    /// Transferred wei.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Gas limit.
    pub gas: u64,
    /// Fee cap in wei.
    pub max_fee_per_gas: u128,
    /// Priority fee in wei.
    pub max_priority_fee_per_gas: u128,
    /// Pre-warmed storage accesses.
    pub access_list: AccessList,
}

/// EIP-4844 blob envelope. The destination stays optional in the model so
/// assertion can reject creation attempts explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancunEnvelope {
    /// Chain id.
    pub chain_id: u64,
    /// Account nonce.
    pub nonce: u64,
    /// Destination; blob transactions may not create contracts.
    pub to: Option<Address>,
    /// Transferred wei.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Gas limit.
    pub gas: u64,
    /// Fee cap in wei.
    pub max_fee_per_gas: u128,
    /// Priority fee in wei.
    pub max_priority_fee_per_gas: u128,
    /// Pre-warmed storage accesses.
    pub access_list: AccessList,
    /// Blob-gas fee cap in wei.
    pub max_fee_per_blob_gas: u128,
    /// Versioned hashes of the carried blobs.
    pub blob_versioned_hashes: Vec<B256>,
}

/// EIP-7702 set-code envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip7702Envelope {
    /// Chain id.
    pub chain_id: u64,
    /// Account nonce.
    pub nonce: u64,
    /// Destination; set-code transactions may not create contracts.
    pub to: Option<Address>,
    /// Transferred wei.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Gas limit.
    pub gas: u64,
    /// Fee cap in wei.
    pub max_fee_per_gas: u128,
    /// Priority fee in wei.
    pub max_priority_fee_per_gas: u128,
    /// Pre-warmed storage accesses.
    pub access_list: AccessList,
    /// Signed delegation authorizations.
    pub authorization_list: Vec<AuthorizationPayload>,
}

/// A fully-populated, pre-signature transaction of one EIP-2718 kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEnvelope {
    /// Pre-2718.
    Legacy(LegacyEnvelope),
    /// EIP-2930.
    Berlin(BerlinEnvelope),
    /// EIP-1559.
    London(LondonEnvelope),
    /// EIP-4844.
    Cancun(CancunEnvelope),
    /// EIP-7702.
    Eip7702(Eip7702Envelope),
}

impl TransactionEnvelope {
    /// The envelope's discriminant.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Legacy(_) => TransactionType::Legacy,
            Self::Berlin(_) => TransactionType::Berlin,
            Self::London(_) => TransactionType::London,
            Self::Cancun(_) => TransactionType::Cancun,
            Self::Eip7702(_) => TransactionType::Eip7702,
        }
    }

    /// The envelope's chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.chain_id,
            Self::Berlin(tx) => tx.chain_id,
            Self::London(tx) => tx.chain_id,
            Self::Cancun(tx) => tx.chain_id,
            Self::Eip7702(tx) => tx.chain_id,
        }
    }

    /// The envelope's nonce.
    #[must_use]
    pub const fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.nonce,
            Self::Berlin(tx) => tx.nonce,
            Self::London(tx) => tx.nonce,
            Self::Cancun(tx) => tx.nonce,
            Self::Eip7702(tx) => tx.nonce,
        }
    }

    /// Converts into the consensus representation for hashing and encoding.
    ///
    /// # Errors
    ///
    /// [`WalletError::CreateBlobTransaction`] /
    /// [`WalletError::CreateEip7702Transaction`] when a kind that requires a
    /// destination has none.
    pub fn to_typed(&self) -> Result<TypedTransaction, WalletError> {
        Ok(match self {
            Self::Legacy(tx) => TypedTransaction::Legacy(TxLegacy {
                chain_id: (tx.chain_id != 0).then_some(tx.chain_id),
                nonce: tx.nonce,
                gas_price: tx.gas_price,
                gas_limit: tx.gas,
                to: tx.to.map_or(TxKind::Create, TxKind::Call),
                value: tx.value,
                input: tx.data.clone(),
            }),
            Self::Berlin(tx) => TypedTransaction::Eip2930(TxEip2930 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_price: tx.gas_price,
                gas_limit: tx.gas,
                to: tx.to.map_or(TxKind::Create, TxKind::Call),
                value: tx.value,
                access_list: tx.access_list.clone(),
                input: tx.data.clone(),
            }),
            Self::London(tx) => TypedTransaction::Eip1559(TxEip1559 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_limit: tx.gas,
                max_fee_per_gas: tx.max_fee_per_gas,
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                to: tx.to.map_or(TxKind::Create, TxKind::Call),
                value: tx.value,
                access_list: tx.access_list.clone(),
                input: tx.data.clone(),
            }),
            Self::Cancun(tx) => TypedTransaction::Eip4844(TxEip4844Variant::TxEip4844(
                tx.to_tx_eip4844()?,
            )),
            Self::Eip7702(tx) => TypedTransaction::Eip7702(TxEip7702 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_limit: tx.gas,
                max_fee_per_gas: tx.max_fee_per_gas,
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                to: tx.to.ok_or(WalletError::CreateEip7702Transaction)?,
                value: tx.value,
                access_list: tx.access_list.clone(),
                authorization_list: tx
                    .authorization_list
                    .iter()
                    .map(AuthorizationPayload::to_signed)
                    .collect(),
                input: tx.data.clone(),
            }),
        })
    }

    /// Rebuilds an envelope from the consensus representation.
    #[must_use]
    pub fn from_typed(typed: TypedTransaction) -> Self {
        match typed {
            TypedTransaction::Legacy(tx) => Self::Legacy(LegacyEnvelope {
                chain_id: tx.chain_id.unwrap_or(0),
                nonce: tx.nonce,
                to: tx.to.to().copied(),
                value: tx.value,
                data: tx.input,
                gas: tx.gas_limit,
                gas_price: tx.gas_price,
            }),
            TypedTransaction::Eip2930(tx) => Self::Berlin(BerlinEnvelope {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                to: tx.to.to().copied(),
                value: tx.value,
                data: tx.input,
                gas: tx.gas_limit,
                gas_price: tx.gas_price,
                access_list: tx.access_list,
            }),
            TypedTransaction::Eip1559(tx) => Self::London(LondonEnvelope {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                to: tx.to.to().copied(),
                value: tx.value,
                data: tx.input,
                gas: tx.gas_limit,
                max_fee_per_gas: tx.max_fee_per_gas,
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                access_list: tx.access_list,
            }),
            TypedTransaction::Eip4844(variant) => {
                let tx = variant.tx().clone();
                Self::Cancun(CancunEnvelope {
                    chain_id: tx.chain_id,
                    nonce: tx.nonce,
                    to: Some(tx.to),
                    value: tx.value,
                    data: tx.input,
                    gas: tx.gas_limit,
                    max_fee_per_gas: tx.max_fee_per_gas,
                    max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                    access_list: tx.access_list,
                    max_fee_per_blob_gas: tx.max_fee_per_blob_gas,
                    blob_versioned_hashes: tx.blob_versioned_hashes,
                })
            }
            TypedTransaction::Eip7702(tx) => Self::Eip7702(Eip7702Envelope {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                to: Some(tx.to),
                value: tx.value,
                data: tx.input,
                gas: tx.gas_limit,
                max_fee_per_gas: tx.max_fee_per_gas,
                max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
                access_list: tx.access_list,
                authorization_list: tx
                    .authorization_list
                    .iter()
                    .map(AuthorizationPayload::from_signed)
                    .collect(),
            }),
        }
    }

    /// The hash the signer commits to.
    pub fn signature_hash(&self) -> Result<B256, WalletError> {
        Ok(match self.to_typed()? {
            TypedTransaction::Legacy(tx) => tx.signature_hash(),
            TypedTransaction::Eip2930(tx) => tx.signature_hash(),
            TypedTransaction::Eip1559(tx) => tx.signature_hash(),
            TypedTransaction::Eip4844(tx) => tx.signature_hash(),
            TypedTransaction::Eip7702(tx) => tx.signature_hash(),
        })
    }

    /// Serializes the signed envelope to its canonical EIP-2718 bytes.
    pub fn encode_signed(&self, signature: Signature) -> Result<Bytes, WalletError> {
        let sealed = seal(self.to_typed()?, signature);
        let mut out = Vec::with_capacity(sealed.encode_2718_len());
        sealed.encode_2718(&mut out);
        Ok(out.into())
    }

    /// Parses canonical EIP-2718 bytes back into an envelope and its
    /// signature.
    pub fn decode_signed(raw: &[u8]) -> Result<(Self, Signature), WalletError> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])?;
        Ok(match envelope {
            TxEnvelope::Legacy(signed) => {
                let (tx, signature, _) = signed.into_parts();
                (Self::from_typed(TypedTransaction::Legacy(tx)), signature)
            }
            TxEnvelope::Eip2930(signed) => {
                let (tx, signature, _) = signed.into_parts();
                (Self::from_typed(TypedTransaction::Eip2930(tx)), signature)
            }
            TxEnvelope::Eip1559(signed) => {
                let (tx, signature, _) = signed.into_parts();
                (Self::from_typed(TypedTransaction::Eip1559(tx)), signature)
            }
            TxEnvelope::Eip4844(signed) => {
                let (tx, signature, _) = signed.into_parts();
                (Self::from_typed(TypedTransaction::Eip4844(tx)), signature)
            }
            TxEnvelope::Eip7702(signed) => {
                let (tx, signature, _) = signed.into_parts();
                (Self::from_typed(TypedTransaction::Eip7702(tx)), signature)
            }
        })
    }
}

impl CancunEnvelope {
    /// Builds the consensus blob transaction (without sidecar).
    pub(crate) fn to_tx_eip4844(&self) -> Result<TxEip4844, WalletError> {
        Ok(TxEip4844 {
            chain_id: self.chain_id,
            nonce: self.nonce,
            gas_limit: self.gas,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: self.to.ok_or(WalletError::CreateBlobTransaction)?,
            value: self.value,
            access_list: self.access_list.clone(),
            blob_versioned_hashes: self.blob_versioned_hashes.clone(),
            max_fee_per_blob_gas: self.max_fee_per_blob_gas,
            input: self.data.clone(),
        })
    }
}

/// Attaches a signature, producing the encodable consensus envelope.
pub(crate) fn seal(typed: TypedTransaction, signature: Signature) -> TxEnvelope {
    match typed {
        TypedTransaction::Legacy(tx) => tx.into_signed(signature).into(),
        TypedTransaction::Eip2930(tx) => tx.into_signed(signature).into(),
        TypedTransaction::Eip1559(tx) => tx.into_signed(signature).into(),
        TypedTransaction::Eip4844(tx) => tx.into_signed(signature).into(),
        TypedTransaction::Eip7702(tx) => tx.into_signed(signature).into(),
    }
}

/// A transaction whose missing fields the wallet fills during preparation.
///
/// Every field except the discriminant is optional; see
/// [`Wallet::prepare`](crate::wallet::Wallet::prepare) for the fill rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpreparedTransactionEnvelope {
    /// Which envelope kind to prepare.
    pub transaction_type: TransactionType,
    /// Chain id; defaults to the configured network.
    pub chain_id: Option<u64>,
    /// Nonce; defaults to the nonce manager's next value.
    pub nonce: Option<u64>,
    /// Destination.
    pub to: Option<Address>,
    /// Transferred wei; defaults to zero.
    pub value: Option<U256>,
    /// Calldata; defaults to empty.
    pub data: Option<Bytes>,
    /// Gas limit; defaults to `eth_estimateGas`.
    pub gas: Option<u64>,
    /// Legacy gas price; defaults to the fee estimator.
    pub gas_price: Option<u128>,
    /// Fee cap; defaults to the fee estimator.
    pub max_fee_per_gas: Option<u128>,
    /// Priority fee; defaults to the fee estimator.
    pub max_priority_fee_per_gas: Option<u128>,
    /// Access list; defaults to empty.
    pub access_list: Option<AccessList>,
    /// Blob-gas fee cap; defaults to the blob fee estimator.
    pub max_fee_per_blob_gas: Option<u128>,
    /// Blob versioned hashes; defaults to empty.
    pub blob_versioned_hashes: Option<Vec<B256>>,
    /// Delegation authorizations; defaults to empty.
    pub authorization_list: Option<Vec<AuthorizationPayload>>,
}

impl UnpreparedTransactionEnvelope {
    /// An empty unprepared envelope of the given kind.
    #[must_use]
    pub fn of_type(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type,
            chain_id: None,
            nonce: None,
            to: None,
            value: None,
            data: None,
            gas: None,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            access_list: None,
            max_fee_per_blob_gas: None,
            blob_versioned_hashes: None,
            authorization_list: None,
        }
    }
}

impl Default for UnpreparedTransactionEnvelope {
    fn default() -> Self {
        Self::of_type(TransactionType::London)
    }
}
