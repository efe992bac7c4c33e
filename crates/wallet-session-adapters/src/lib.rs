pub mod abi;
pub mod config;
pub mod ens;
pub mod fallback;
pub mod injected;
pub mod pools;
mod rpc;

pub use abi::AbiRegistryAdapter;
pub use config::SessionAdapterConfig;
pub use fallback::FallbackRpcAdapter;
pub use injected::InjectedWalletAdapter;
pub use pools::PoolDataAdapter;
