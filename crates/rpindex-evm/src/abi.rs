//! The handful of ABI pieces the Rocket Pool contracts need.
//!
//! Arguments and return values go through `alloy`'s dynamic ABI codec. Only
//! static types appear (`address`, `bytes32`, `bool`).

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::B256;
use thiserror::Error;

use rpindex_core::{Address, IndexerError};

/// `RocketStorage` event emitted when a node's withdrawal address changes.
pub const NODE_WITHDRAWAL_ADDRESS_SET: &str = "NodeWithdrawalAddressSet(address,address,uint256)";
/// `RocketStorage.getAddress(bytes32)`.
pub const GET_ADDRESS: &str = "getAddress(bytes32)";
/// `RocketMinipoolManager.getMinipoolExists(address)`.
pub const GET_MINIPOOL_EXISTS: &str = "getMinipoolExists(address)";
/// `RocketMinipool.getNodeAddress()`.
pub const GET_NODE_ADDRESS: &str = "getNodeAddress()";
/// ENS registry `resolver(bytes32)`.
pub const ENS_RESOLVER: &str = "resolver(bytes32)";
/// ENS public resolver `addr(bytes32)`.
pub const ENS_ADDR: &str = "addr(bytes32)";

pub type Word = [u8; 32];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("invalid hex {0:?}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("{0}")]
    Decode(String),

    #[error("expected {expected}, decoded {got}")]
    Unexpected { expected: &'static str, got: String },
}

impl From<AbiError> for IndexerError {
    fn from(e: AbiError) -> Self {
        IndexerError::ChainCall(format!("ABI decode: {e}"))
    }
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Word {
    alloy_primitives::keccak256(data).0
}

/// 4-byte function selector for a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// topic0 of an event, `0x`-prefixed.
pub fn event_topic(signature: &str) -> String {
    word_to_hex(&keccak256(signature.as_bytes()))
}

pub fn word_to_hex(word: &Word) -> String {
    format!("0x{}", hex::encode(word))
}

pub fn address_arg(address: &Address) -> DynSolValue {
    DynSolValue::Address((*address).into())
}

pub fn bytes32_arg(word: Word) -> DynSolValue {
    DynSolValue::FixedBytes(B256::from(word), 32)
}

/// Calldata for `signature` applied to `args`.
pub fn encode_call(signature: &str, args: &[DynSolValue]) -> String {
    let mut data = selector(signature).to_vec();
    data.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
    format!("0x{}", hex::encode(data))
}

fn decode_hex(data: &str) -> Result<Vec<u8>, AbiError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|_| AbiError::InvalidHex(data.to_string()))
}

fn decode_as(ty: DynSolType, bytes: &[u8]) -> Result<DynSolValue, AbiError> {
    ty.abi_decode(bytes).map_err(|e| AbiError::Decode(e.to_string()))
}

fn expect_address(value: DynSolValue) -> Result<Address, AbiError> {
    match value {
        DynSolValue::Address(a) => Ok(a.into()),
        other => Err(AbiError::Unexpected {
            expected: "address",
            got: format!("{other:?}"),
        }),
    }
}

/// Decode an `address` return value.
pub fn decode_address(data: &str) -> Result<Address, AbiError> {
    let bytes = decode_hex(data)?;
    expect_address(decode_as(DynSolType::Address, &bytes)?)
}

/// Decode a `bool` return value.
pub fn decode_bool(data: &str) -> Result<bool, AbiError> {
    let bytes = decode_hex(data)?;
    match decode_as(DynSolType::Bool, &bytes)? {
        DynSolValue::Bool(b) => Ok(b),
        other => Err(AbiError::Unexpected {
            expected: "bool",
            got: format!("{other:?}"),
        }),
    }
}

/// Decode an indexed `address` event topic. Topics are exactly one word.
pub fn topic_to_address(topic: &str) -> Result<Address, AbiError> {
    let bytes = decode_hex(topic)?;
    if bytes.len() != 32 {
        return Err(AbiError::BadLength {
            expected: 32,
            got: bytes.len(),
        });
    }
    expect_address(decode_as(DynSolType::Address, &bytes)?)
}

/// EIP-137 namehash.
pub fn namehash(name: &str) -> Word {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&label_hash);
        node = keccak256(&buf);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        assert_eq!(hex::encode(selector(ENS_RESOLVER)), "0178b8bf");
        assert_eq!(hex::encode(selector(ENS_ADDR)), "3b3b57de");
    }

    #[test]
    fn transfer_topic() {
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn withdrawal_topic_shape() {
        let topic = event_topic(NODE_WITHDRAWAL_ADDRESS_SET);
        assert_eq!(topic.len(), 66);
        assert!(topic.starts_with("0x"));
    }

    #[test]
    fn namehash_vectors() {
        assert_eq!(namehash(""), [0u8; 32]);
        assert_eq!(
            hex::encode(namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            hex::encode(namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn encode_address_call() {
        let addr = Address::new([0x11; 20]);
        let data = encode_call("balanceOf(address)", &[address_arg(&addr)]);
        assert_eq!(
            data,
            format!("0x70a08231{}{}", "00".repeat(12), "11".repeat(20))
        );
    }

    #[test]
    fn encode_bytes32_and_empty_calls() {
        let node = namehash("eth");
        let data = encode_call(ENS_RESOLVER, &[bytes32_arg(node)]);
        assert_eq!(data, format!("0x0178b8bf{}", hex::encode(node)));
        assert_eq!(encode_call(GET_NODE_ADDRESS, &[]).len(), 2 + 8);
    }

    #[test]
    fn decode_return_words() {
        let t = DynSolValue::Bool(true).abi_encode();
        let f = DynSolValue::Bool(false).abi_encode();
        assert!(decode_bool(&format!("0x{}", hex::encode(t))).unwrap());
        assert!(!decode_bool(&format!("0x{}", hex::encode(f))).unwrap());

        let addr_word = format!("0x{}{}", "00".repeat(12), "ab".repeat(20));
        assert_eq!(decode_address(&addr_word).unwrap(), Address::new([0xab; 20]));
    }

    #[test]
    fn decode_rejects_short_and_invalid() {
        assert!(matches!(decode_bool("0x"), Err(AbiError::Decode(_))));
        assert!(matches!(decode_address("0xzz"), Err(AbiError::InvalidHex(_))));
        let long = format!("0x{}", "00".repeat(33));
        assert_eq!(
            topic_to_address(&long),
            Err(AbiError::BadLength { expected: 32, got: 33 })
        );
    }

    #[test]
    fn topic_address() {
        let topic = format!("0x{}{}", "00".repeat(12), "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        let addr = topic_to_address(&topic).unwrap();
        assert_eq!(addr.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }
}
