use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Provider-selection phases. The wallet path is always attempted first; the
/// fallback path is entered only from a connected wallet on an unsupported
/// chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    ConnectingWallet,
    WalletConnected,
    ConnectingFallback,
    FallbackConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    BeginWalletConnect,
    WalletConnectSucceeded,
    BeginFallback,
    FallbackSucceeded,
    ConnectFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ConnectionPhase,
    pub to: ConnectionPhase,
}

/// Pure transition function for the connection phase. Wallet events may
/// re-enter the connect path from either connected phase; everything else is
/// rejected.
pub fn connection_transition(
    phase: ConnectionPhase,
    action: ConnectionAction,
) -> Result<(ConnectionPhase, StateTransition), SessionError> {
    use ConnectionAction::*;
    use ConnectionPhase::*;

    let to = match (phase, action) {
        (Disconnected | WalletConnected | FallbackConnected, BeginWalletConnect) => ConnectingWallet,
        (ConnectingWallet, WalletConnectSucceeded) => WalletConnected,
        (WalletConnected, BeginFallback) => ConnectingFallback,
        (ConnectingFallback, FallbackSucceeded) => FallbackConnected,
        (ConnectingWallet | ConnectingFallback, ConnectFailed) => Disconnected,
        _ => {
            return Err(SessionError::IllegalTransition {
                from: phase,
                action,
            })
        }
    };
    Ok((to, StateTransition { from: phase, to }))
}
