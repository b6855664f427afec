//! Startup resolution of the Rocket Pool contract addresses.
//!
//! `RocketStorage` is found through ENS unless configured explicitly; the
//! minipool manager is then read from `RocketStorage`'s address registry.

use rpindex_core::{Address, IndexerError};

use crate::abi;
use crate::rpc::RpcCaller;

/// ENS registry, same address on every network.
pub const ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";
pub const ROCKET_STORAGE_ENS_NAME: &str = "rocketstorage.eth";
/// `RocketStorage` key under which the minipool manager is registered.
pub const MINIPOOL_MANAGER_KEY: &str = "contract.addressrocketMinipoolManager";

/// Addresses of the contracts the index reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RocketContracts {
    pub rocket_storage: Address,
    pub minipool_manager: Address,
}

impl RocketContracts {
    /// Resolve both contracts. `rocket_storage` skips the ENS lookup when set.
    pub async fn resolve(
        rpc: &RpcCaller,
        rocket_storage: Option<Address>,
    ) -> Result<Self, IndexerError> {
        let rocket_storage = match rocket_storage {
            Some(address) => address,
            None => resolve_ens_name(rpc, ROCKET_STORAGE_ENS_NAME).await?,
        };
        tracing::info!(address = %rocket_storage.to_checksum(), "Rocket Storage");

        let minipool_manager = storage_address(rpc, &rocket_storage, MINIPOOL_MANAGER_KEY).await?;
        tracing::info!(address = %minipool_manager.to_checksum(), "Rocket Minipool Manager");

        Ok(Self {
            rocket_storage,
            minipool_manager,
        })
    }
}

/// Forward-resolve an ENS name through the registry and its resolver.
pub async fn resolve_ens_name(rpc: &RpcCaller, name: &str) -> Result<Address, IndexerError> {
    let registry = Address::parse(ENS_REGISTRY)?;
    let node = abi::namehash(name);

    let resolver = abi::decode_address(
        &rpc.eth_call(&registry, abi::encode_call(abi::ENS_RESOLVER, &[abi::bytes32_arg(node)]))
            .await?,
    )?;
    if resolver.is_zero() {
        return Err(IndexerError::ChainCall(format!("ENS name {name} has no resolver")));
    }

    let address = abi::decode_address(
        &rpc.eth_call(&resolver, abi::encode_call(abi::ENS_ADDR, &[abi::bytes32_arg(node)]))
            .await?,
    )?;
    if address.is_zero() {
        return Err(IndexerError::ChainCall(format!("ENS name {name} does not resolve")));
    }
    tracing::debug!(name, %address, "ENS name resolved");
    Ok(address)
}

/// `RocketStorage.getAddress(keccak256(key))`.
pub async fn storage_address(
    rpc: &RpcCaller,
    rocket_storage: &Address,
    key: &str,
) -> Result<Address, IndexerError> {
    let slot = abi::bytes32_arg(abi::keccak256(key.as_bytes()));
    let data = abi::encode_call(abi::GET_ADDRESS, &[slot]);
    let address = abi::decode_address(&rpc.eth_call(rocket_storage, data).await?)?;
    if address.is_zero() {
        return Err(IndexerError::ChainCall(format!(
            "RocketStorage {rocket_storage} has no address for {key}"
        )));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{address_word, call_target, calls, MockTransport};
    use serde_json::Value;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[tokio::test]
    async fn resolves_through_ens() {
        let registry = Address::parse(ENS_REGISTRY).unwrap().to_canonical();
        let mock = MockTransport::new(move |req| {
            let (to, data) = call_target(req);
            let answer = if to == registry && calls(&data, abi::ENS_RESOLVER) {
                addr(0xe1)
            } else if to == addr(0xe1).to_canonical() && calls(&data, abi::ENS_ADDR) {
                addr(0x55)
            } else if to == addr(0x55).to_canonical() && calls(&data, abi::GET_ADDRESS) {
                addr(0x66)
            } else {
                Address::ZERO
            };
            Ok(address_word(&answer))
        });
        let rpc = RpcCaller::new(mock.clone());

        let contracts = RocketContracts::resolve(&rpc, None).await.unwrap();
        assert_eq!(contracts.rocket_storage, addr(0x55));
        assert_eq!(contracts.minipool_manager, addr(0x66));
        assert_eq!(mock.requests().len(), 3);

        // The registry key is the keccak of the contract name.
        let (_, data) = call_target(&mock.requests()[2]);
        assert!(data.ends_with(&hex::encode(abi::keccak256(MINIPOOL_MANAGER_KEY.as_bytes()))));
    }

    #[tokio::test]
    async fn explicit_storage_skips_ens() {
        let mock = MockTransport::new(|_| Ok(address_word(&addr(0x66))));
        let rpc = RpcCaller::new(mock.clone());

        let contracts = RocketContracts::resolve(&rpc, Some(addr(0x55))).await.unwrap();
        assert_eq!(contracts.minipool_manager, addr(0x66));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_resolver_is_error() {
        let rpc = RpcCaller::new(MockTransport::new(|_| Ok(address_word(&Address::ZERO))));
        let err = resolve_ens_name(&rpc, "nothing.eth").await.unwrap_err();
        assert!(matches!(err, IndexerError::ChainCall(ref m) if m.contains("no resolver")));
    }

    #[tokio::test]
    async fn unregistered_key_is_error() {
        let rpc = RpcCaller::new(MockTransport::new(|_| Ok(Value::String("0x".into()))));
        assert!(storage_address(&rpc, &addr(1), MINIPOOL_MANAGER_KEY).await.is_err());
    }
}
