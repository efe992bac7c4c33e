pub mod domain;
pub mod error;
pub mod manager;
pub mod ports;
pub mod state_machine;

pub use domain::{
    ConnectionState, ContractKind, NetworkInfo, Notification, NotificationLog, Op, ProviderKind,
    SessionConfig, TokenEntry, WalletEvent, WalletEventKind, NATIVE_BALANCE_KEY,
};
pub use error::SessionError;
pub use manager::ConnectionManager;
pub use ports::{
    AbiRegistryPort, ClientPort, FallbackClientPort, PoolDataPort, PortError, WalletProviderPort,
};
pub use state_machine::{connection_transition, ConnectionAction, ConnectionPhase, StateTransition};
