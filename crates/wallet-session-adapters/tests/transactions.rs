mod common;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;
use wallet_session_core::{ContractKind, Op, SessionError};

use common::*;

fn transfer_args() -> Vec<DynSolValue> {
    vec![
        DynSolValue::Address(OTHER_ACCOUNT),
        DynSolValue::Uint(U256::from(QUARTER_ETHER), 256),
    ]
}

#[tokio::test]
async fn confirmed_transfer_reports_success() {
    let mut m = primed_manager();
    m.login().await.unwrap();

    m.send_transaction(ContractKind::Token, DAI, "transfer", &transfer_args())
        .await
        .unwrap();

    assert_eq!(m.log().successes(Op::SendTransaction), 1);
    assert_eq!(m.log().failures(Op::SendTransaction), 0);
}

#[tokio::test]
async fn rejected_submission_reports_failure() {
    let mut m = primed_manager();
    m.login().await.unwrap();
    m.wallet.debug_set_send_failure(true).unwrap();

    let err = m
        .send_transaction(ContractKind::Token, DAI, "transfer", &transfer_args())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Transaction(_)));
    assert_eq!(m.log().successes(Op::SendTransaction), 0);
    assert_eq!(m.log().failures(Op::SendTransaction), 1);
}

#[tokio::test]
async fn unconfirmed_transaction_is_a_failure() {
    let mut m = primed_manager();
    m.login().await.unwrap();
    m.wallet.debug_set_confirmation_failure(true).unwrap();

    let err = m
        .send_transaction(ContractKind::Token, DAI, "transfer", &transfer_args())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("confirmation"));
    assert_eq!(m.log().successes(Op::SendTransaction), 0);
}

#[tokio::test]
async fn fallback_session_has_no_signer() {
    let mut m = primed_manager();
    m.wallet.debug_set_chain_id(42).unwrap();
    m.login().await.unwrap();

    let err = m
        .send_transaction(ContractKind::Token, DAI, "transfer", &transfer_args())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no signer"));
    assert_eq!(m.log().failures(Op::SendTransaction), 1);
}

#[tokio::test]
async fn argument_mismatch_fails_before_submission() {
    let mut m = primed_manager();
    m.login().await.unwrap();

    let err = m
        .send_transaction(
            ContractKind::Token,
            DAI,
            "transfer",
            &[DynSolValue::Address(OTHER_ACCOUNT)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Transaction(_)));
    assert!(err.to_string().contains("argument count mismatch"));
}

#[tokio::test]
async fn pool_join_goes_through_the_pool_interface() {
    let mut m = primed_manager();
    m.login().await.unwrap();

    m.send_transaction(
        ContractKind::Pool,
        PROXY,
        "joinPool",
        &[
            DynSolValue::Uint(U256::from(1u64), 256),
            DynSolValue::Array(vec![
                DynSolValue::Uint(U256::from(QUARTER_ETHER), 256),
                DynSolValue::Uint(U256::from(QUARTER_ETHER), 256),
            ]),
        ],
    )
    .await
    .unwrap();
    assert_eq!(m.log().successes(Op::SendTransaction), 1);
}
