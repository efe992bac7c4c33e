use thiserror::Error;

use crate::state_machine::{ConnectionAction, ConnectionPhase};

/// Operation-level error taxonomy. Transport and validation details from the
/// ports are folded into the message of the matching variant at the call
/// site, so callers react to the category rather than the wire error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection failure: {0}")]
    Connection(String),
    #[error("name resolution failure: {0}")]
    NameResolution(String),
    #[error("transaction failure: {0}")]
    Transaction(String),
    #[error("balance query failure: {0}")]
    BalanceQuery(String),
    #[error("proxy query failure: {0}")]
    ProxyQuery(String),
    #[error("account data failure: {0}")]
    AccountData(String),
    #[error("illegal connection transition: {from:?} on {action:?}")]
    IllegalTransition {
        from: ConnectionPhase,
        action: ConnectionAction,
    },
}
