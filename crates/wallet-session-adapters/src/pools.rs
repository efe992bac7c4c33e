use std::sync::{Arc, Mutex};

use alloy::primitives::Address;
use async_trait::async_trait;

use wallet_session_core::{PoolDataPort, PortError};

/// In-memory pool-data collaborator. Records which accounts were loaded so
/// tests can assert the joined account refresh reached it.
#[derive(Debug, Clone, Default)]
pub struct PoolDataAdapter {
    state: Arc<Mutex<PoolState>>,
}

#[derive(Debug, Default)]
struct PoolState {
    position_loads: Vec<Address>,
    share_loads: Vec<Address>,
    fail: bool,
}

impl PoolDataAdapter {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PoolState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("pool data lock poisoned: {e}")))
    }

    pub fn position_loads(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.lock()?.position_loads.clone())
    }

    pub fn share_loads(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.lock()?.share_loads.clone())
    }

    pub fn debug_set_failure(&self, fail: bool) -> Result<(), PortError> {
        self.lock()?.fail = fail;
        Ok(())
    }
}

#[async_trait]
impl PoolDataPort for PoolDataAdapter {
    async fn load_pool_positions(&self, account: Address) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if g.fail {
            return Err(PortError::Transport("pool data source unavailable".to_owned()));
        }
        g.position_loads.push(account);
        Ok(())
    }

    async fn load_pool_shares(&self, account: Address) -> Result<(), PortError> {
        let mut g = self.lock()?;
        if g.fail {
            return Err(PortError::Transport("pool data source unavailable".to_owned()));
        }
        g.share_loads.push(account);
        Ok(())
    }
}
