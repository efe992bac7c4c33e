use std::collections::HashMap;

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Bytes;

use wallet_session_core::{AbiRegistryPort, ContractKind, PortError};

const TOKEN_ABI: &str = r#"[
  {"type":"function","name":"balanceOf","stateMutability":"view","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"balance","type":"uint256"}]},
  {"type":"function","name":"decimals","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint8"}]},
  {"type":"function","name":"transfer","stateMutability":"nonpayable","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"approve","stateMutability":"nonpayable","inputs":[{"name":"spender","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]}
]"#;

const MULTICALL_ABI: &str = r#"[
  {"type":"function","name":"aggregate","stateMutability":"nonpayable","inputs":[{"name":"calls","type":"tuple[]","components":[{"name":"target","type":"address"},{"name":"callData","type":"bytes"}]}],"outputs":[{"name":"blockNumber","type":"uint256"},{"name":"returnData","type":"bytes[]"}]},
  {"type":"function","name":"getEthBalance","stateMutability":"view","inputs":[{"name":"addr","type":"address"}],"outputs":[{"name":"balance","type":"uint256"}]}
]"#;

const PROXY_REGISTRY_ABI: &str = r#"[
  {"type":"function","name":"proxies","stateMutability":"view","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"proxy","type":"address"}]},
  {"type":"function","name":"build","stateMutability":"nonpayable","inputs":[],"outputs":[{"name":"proxy","type":"address"}]}
]"#;

const POOL_ABI: &str = r#"[
  {"type":"function","name":"joinPool","stateMutability":"nonpayable","inputs":[{"name":"poolAmountOut","type":"uint256"},{"name":"maxAmountsIn","type":"uint256[]"}],"outputs":[]},
  {"type":"function","name":"exitPool","stateMutability":"nonpayable","inputs":[{"name":"poolAmountIn","type":"uint256"},{"name":"minAmountsOut","type":"uint256[]"}],"outputs":[]}
]"#;

/// Built-in interface registry for the contracts the session talks to.
#[derive(Debug, Clone)]
pub struct AbiRegistryAdapter {
    abis: HashMap<ContractKind, JsonAbi>,
}

impl Default for AbiRegistryAdapter {
    fn default() -> Self {
        Self::new().expect("built-in contract interfaces parse")
    }
}

impl AbiRegistryAdapter {
    pub fn new() -> Result<Self, PortError> {
        let mut abis = HashMap::new();
        for (kind, json) in [
            (ContractKind::Token, TOKEN_ABI),
            (ContractKind::Multicall, MULTICALL_ABI),
            (ContractKind::ProxyRegistry, PROXY_REGISTRY_ABI),
            (ContractKind::Pool, POOL_ABI),
        ] {
            let abi: JsonAbi = serde_json::from_str(json)
                .map_err(|e| PortError::Validation(format!("invalid {kind:?} abi json: {e}")))?;
            abis.insert(kind, abi);
        }
        Ok(Self { abis })
    }

    fn function(&self, kind: ContractKind, method: &str) -> Result<&Function, PortError> {
        let abi = self
            .abis
            .get(&kind)
            .ok_or_else(|| PortError::NotFound(format!("no interface for {kind:?}")))?;
        abi.function(method)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| PortError::Validation(format!("method not found: {kind:?}.{method}")))
    }
}

impl AbiRegistryPort for AbiRegistryAdapter {
    fn encode_call(
        &self,
        kind: ContractKind,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Bytes, PortError> {
        let function = self.function(kind, method)?;
        if function.inputs.len() != args.len() {
            return Err(PortError::Validation(format!(
                "{kind:?}.{method} argument count mismatch: expected {}, got {}",
                function.inputs.len(),
                args.len()
            )));
        }
        let encoded = function
            .abi_encode_input(args)
            .map_err(|e| PortError::Validation(format!("{kind:?}.{method} encoding failed: {e}")))?;
        Ok(Bytes::from(encoded))
    }

    fn decode_output(
        &self,
        kind: ContractKind,
        method: &str,
        data: &[u8],
    ) -> Result<Vec<DynSolValue>, PortError> {
        let function = self.function(kind, method)?;
        let mut output_types = Vec::with_capacity(function.outputs.len());
        for output in &function.outputs {
            let ty = output.resolve().map_err(|e| {
                PortError::Validation(format!("unsupported output type '{}': {e}", output.ty))
            })?;
            output_types.push(ty);
        }
        let decoded = DynSolType::Tuple(output_types)
            .abi_decode_params(data)
            .map_err(|e| PortError::Validation(format!("{kind:?}.{method} decode failed: {e}")))?;
        Ok(match decoded {
            DynSolValue::Tuple(values) => values,
            single => vec![single],
        })
    }
}
