mod common;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{keccak256, U256};

use wallet_session_adapters::AbiRegistryAdapter;
use wallet_session_core::{AbiRegistryPort, ContractKind};

use common::*;

#[test]
fn balance_of_calldata_carries_the_known_selector() {
    let abi = AbiRegistryAdapter::default();
    let data = abi
        .encode_call(
            ContractKind::Token,
            "balanceOf",
            &[DynSolValue::Address(ACCOUNT)],
        )
        .unwrap();
    assert_eq!(data.len(), 36);
    assert_eq!(&data[..4], &keccak256(b"balanceOf(address)")[..4]);
    assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
}

#[test]
fn aggregate_round_trips_target_call_pairs() {
    let abi = AbiRegistryAdapter::default();
    let inner = abi
        .encode_call(
            ContractKind::Token,
            "balanceOf",
            &[DynSolValue::Address(ACCOUNT)],
        )
        .unwrap();
    let data = abi
        .encode_call(
            ContractKind::Multicall,
            "aggregate",
            &[DynSolValue::Array(vec![DynSolValue::Tuple(vec![
                DynSolValue::Address(DAI),
                DynSolValue::Bytes(inner.to_vec()),
            ])])],
        )
        .unwrap();
    assert_eq!(&data[..4], &keccak256(b"aggregate((address,bytes)[])")[..4]);

    let encoded_result = DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(100u64), 256),
        DynSolValue::Array(vec![DynSolValue::Bytes(
            uint_word(U256::from(7u64)).to_vec(),
        )]),
    ])
    .abi_encode_params();
    let decoded = abi
        .decode_output(ContractKind::Multicall, "aggregate", &encoded_result)
        .unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(
        decoded[0].as_uint().map(|(v, _)| v),
        Some(U256::from(100u64))
    );
    let blobs = decoded[1].as_array().unwrap();
    assert_eq!(blobs.len(), 1);
}

#[test]
fn proxies_output_decodes_to_an_address() {
    let abi = AbiRegistryAdapter::default();
    let decoded = abi
        .decode_output(ContractKind::ProxyRegistry, "proxies", &address_word(PROXY))
        .unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].as_address(), Some(PROXY));
}

#[test]
fn argument_count_is_validated() {
    let abi = AbiRegistryAdapter::default();
    let err = abi
        .encode_call(ContractKind::Token, "transfer", &[DynSolValue::Address(DAI)])
        .unwrap_err();
    assert!(err.to_string().contains("argument count mismatch"));
}

#[test]
fn unknown_methods_are_rejected() {
    let abi = AbiRegistryAdapter::default();
    let err = abi
        .encode_call(ContractKind::Token, "mint", &[])
        .unwrap_err();
    assert!(err.to_string().contains("method not found"));
}

#[test]
fn pool_methods_exist_for_both_directions() {
    let abi = AbiRegistryAdapter::default();
    for method in ["joinPool", "exitPool"] {
        let data = abi
            .encode_call(
                ContractKind::Pool,
                method,
                &[
                    DynSolValue::Uint(U256::from(1u64), 256),
                    DynSolValue::Array(vec![DynSolValue::Uint(U256::ZERO, 256)]),
                ],
            )
            .unwrap();
        assert!(data.len() > 4);
    }
}
