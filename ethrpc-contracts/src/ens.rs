//! ENS resolution through the universal resolver.

use alloy_primitives::{Address, B256, Bytes, hex, keccak256};
use alloy_sol_types::{SolCall, SolValue, sol};
use ethrpc::{EnsContracts, Provider, Transport};

use crate::call_request;
use crate::error::ContractsError;

sol! {
    /// The deployed ENS universal resolver surface this module uses.
    #[allow(missing_docs)]
    interface IUniversalResolver {
        function resolve(bytes name, bytes data) external view returns (bytes, address);
        function reverse(bytes reverseName) external view returns (string, address, address, address);
    }

    #[allow(missing_docs)]
    interface IAddrResolver {
        function addr(bytes32 node) external view returns (address);
    }

    #[allow(missing_docs)]
    interface ITextResolver {
        function text(bytes32 node, string key) external view returns (string);
    }
}

/// Recursive keccak-256 namehash of an ENS name. The empty name hashes to
/// zero.
#[must_use]
pub fn namehash(name: &str) -> B256 {
    if name.is_empty() {
        return B256::ZERO;
    }
    let mut node = B256::ZERO;
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        node = keccak256([node.as_slice(), label_hash.as_slice()].concat());
    }
    node
}

/// DNS wire form of an ENS name: length-prefixed labels with a zero
/// terminator.
pub fn dns_encode(name: &str) -> Result<Bytes, ContractsError> {
    let mut encoded = Vec::with_capacity(name.len() + 2);
    for label in name.split('.') {
        if label.is_empty() || label.len() > 255 {
            return Err(ContractsError::InvalidEnsName(name.to_owned()));
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    Ok(encoded.into())
}

/// The `<40-hex-lowercase>.addr.reverse` name for a checksummed address.
///
/// The input must be EIP-55 checksummed; a lowercase-only rendering is
/// rejected before any hashing happens.
pub fn reverse_name(address: &str) -> Result<String, ContractsError> {
    let checked = Address::parse_checksummed(address, None)
        .map_err(|_| ContractsError::InvalidAddressChecksum(address.to_owned()))?;
    Ok(format!("{}.addr.reverse", hex::encode(checked)))
}

/// ENS resolution over one provider.
#[derive(Debug)]
pub struct EnsResolver<'a, T> {
    provider: &'a Provider<T>,
    contracts: EnsContracts,
}

impl<'a, T: Transport> EnsResolver<'a, T> {
    /// Binds the resolver to `provider`.
    ///
    /// # Errors
    ///
    /// [`ContractsError::ExpectedEnsContracts`] when the network
    /// configuration has no ENS contract set.
    pub fn new(provider: &'a Provider<T>) -> Result<Self, ContractsError> {
        let contracts = provider
            .network()
            .ens
            .ok_or(ContractsError::ExpectedEnsContracts)?;
        Ok(Self {
            provider,
            contracts,
        })
    }

    /// Resolves `name` to its address record.
    pub async fn get_ens_address(&self, name: &str) -> Result<Address, ContractsError> {
        let node = namehash(name);
        let inner = IAddrResolver::addrCall { node }.abi_encode();
        let payload = self.resolve(name, inner).await?;
        decode_address_record(&payload)
    }

    /// Resolves the `key` text record of `name`.
    pub async fn get_ens_text(&self, name: &str, key: &str) -> Result<String, ContractsError> {
        let node = namehash(name);
        let inner = ITextResolver::textCall {
            node,
            key: key.to_owned(),
        }
        .abi_encode();
        let payload = self.resolve(name, inner).await?;
        decode_text_record(&payload)
    }

    /// Reverse-resolves a checksummed address rendering to its primary name.
    pub async fn get_ens_name(&self, address: &str) -> Result<String, ContractsError> {
        let name = reverse_name(address)?;
        let calldata = IUniversalResolver::reverseCall {
            reverseName: dns_encode(&name)?,
        }
        .abi_encode();
        let reply = self
            .provider
            .call(
                &call_request(self.contracts.universal_resolver, calldata),
                None,
            )
            .await?;
        let decoded = IUniversalResolver::reverseCall::abi_decode_returns(&reply)?;
        if decoded._0.is_empty() {
            return Err(ContractsError::FailedToDecodeResponse);
        }
        Ok(decoded._0)
    }

    /// Routes an inner resolver call through `resolve(name, data)` and
    /// returns the inner reply bytes.
    async fn resolve(&self, name: &str, inner: Vec<u8>) -> Result<Bytes, ContractsError> {
        let calldata = IUniversalResolver::resolveCall {
            name: dns_encode(name)?,
            data: inner.into(),
        }
        .abi_encode();
        let reply = self
            .provider
            .call(
                &call_request(self.contracts.universal_resolver, calldata),
                None,
            )
            .await?;
        let decoded = IUniversalResolver::resolveCall::abi_decode_returns(&reply)?;
        Ok(decoded._0)
    }
}

/// Decodes the inner `addr(bytes32)` reply.
pub(crate) fn decode_address_record(payload: &[u8]) -> Result<Address, ContractsError> {
    if payload.is_empty() {
        return Err(ContractsError::FailedToDecodeResponse);
    }
    Ok(Address::abi_decode(payload)?)
}

/// Decodes the inner `text(bytes32,string)` reply.
pub(crate) fn decode_text_record(payload: &[u8]) -> Result<String, ContractsError> {
    if payload.is_empty() {
        return Err(ContractsError::FailedToDecodeResponse);
    }
    Ok(String::abi_decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn namehash_matches_known_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
    }

    #[test]
    fn dns_encoding_is_length_prefixed() {
        assert_eq!(dns_encode("foo.eth").unwrap().as_ref(), b"\x03foo\x03eth\x00");
        assert!(matches!(
            dns_encode("foo..eth"),
            Err(ContractsError::InvalidEnsName(_))
        ));
        assert!(matches!(
            dns_encode(""),
            Err(ContractsError::InvalidEnsName(_))
        ));
    }

    #[test]
    fn reverse_name_requires_a_checksummed_address() {
        let name = reverse_name("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap();
        assert_eq!(name, "70997970c51812dc3a010c7d01b50e0d17dc79c8.addr.reverse");

        assert!(matches!(
            reverse_name("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"),
            Err(ContractsError::InvalidAddressChecksum(_))
        ));
    }

    #[test]
    fn empty_record_payloads_fail_to_decode() {
        assert!(matches!(
            decode_address_record(&[]),
            Err(ContractsError::FailedToDecodeResponse)
        ));
        assert!(matches!(
            decode_text_record(&[]),
            Err(ContractsError::FailedToDecodeResponse)
        ));
    }

    #[test]
    fn address_records_round_trip() {
        let expected = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
        let payload = expected.abi_encode();
        assert_eq!(decode_address_record(&payload).unwrap(), expected);
    }

    #[test]
    fn text_records_round_trip() {
        let payload = String::from("https://example.org").abi_encode();
        assert_eq!(decode_text_record(&payload).unwrap(), "https://example.org");
    }
}
