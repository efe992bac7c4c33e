use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{address, keccak256, Address, Bytes, B256};

use wallet_session_core::PortError;

use crate::rpc::JsonRpcClient;

/// The name service registry deployed at the same address on every supported
/// chain.
pub const NAME_SERVICE_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Recursive label hash over the dot-separated name, folded from the right.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    for label in name.split('.').rev() {
        if label.is_empty() {
            continue;
        }
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

/// Reverse lookup: resolve the `<address>.addr.reverse` record to a name.
pub(crate) async fn lookup_address(
    rpc: &JsonRpcClient,
    address: Address,
) -> Result<String, PortError> {
    let node = namehash(&format!("{address:x}.addr.reverse"));
    let resolver = resolver_for(rpc, node).await?;
    let raw = rpc
        .eth_call(resolver, &node_call("name(bytes32)", node))
        .await?;
    let decoded = DynSolType::Tuple(vec![DynSolType::String])
        .abi_decode_params(&raw)
        .map_err(|e| PortError::Transport(format!("name record decode failed: {e}")))?;
    let name = match decoded {
        DynSolValue::Tuple(values) => values
            .into_iter()
            .next()
            .and_then(|v| v.as_str().map(str::to_owned)),
        other => other.as_str().map(str::to_owned),
    }
    .ok_or_else(|| PortError::Transport("name record is not a string".to_owned()))?;
    if name.is_empty() {
        return Err(PortError::NotFound(format!(
            "no reverse record for {address}"
        )));
    }
    Ok(name)
}

/// Forward lookup through the registry and the name's resolver.
pub(crate) async fn resolve_name(rpc: &JsonRpcClient, name: &str) -> Result<Address, PortError> {
    let node = namehash(name);
    let resolver = resolver_for(rpc, node).await?;
    let raw = rpc
        .eth_call(resolver, &node_call("addr(bytes32)", node))
        .await?;
    let resolved = word_to_address(&raw)?;
    if resolved == Address::ZERO {
        return Err(PortError::NotFound(format!("name does not resolve: {name}")));
    }
    Ok(resolved)
}

async fn resolver_for(rpc: &JsonRpcClient, node: B256) -> Result<Address, PortError> {
    let raw = rpc
        .eth_call(NAME_SERVICE_REGISTRY, &node_call("resolver(bytes32)", node))
        .await?;
    let resolver = word_to_address(&raw)?;
    if resolver == Address::ZERO {
        return Err(PortError::NotFound("no resolver set".to_owned()));
    }
    Ok(resolver)
}

fn node_call(signature: &str, node: B256) -> Bytes {
    let selector = &keccak256(signature.as_bytes())[..4];
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(selector);
    data.extend_from_slice(node.as_slice());
    Bytes::from(data)
}

fn word_to_address(data: &[u8]) -> Result<Address, PortError> {
    if data.len() < 32 {
        return Err(PortError::Transport(format!(
            "address word too short: {} bytes",
            data.len()
        )));
    }
    Ok(Address::from_slice(&data[12..32]))
}
