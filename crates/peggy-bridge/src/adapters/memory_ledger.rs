use crate::error::{BridgeError, BridgeResult, StoreError};
use crate::ports::TokenLedger;
use peggy_types::{AccountAddress, U256};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory token ledger for testing
pub struct InMemoryTokenLedger {
    balances: RwLock<BTreeMap<(AccountAddress, String), U256>>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn balance_of(&self, account: &AccountAddress, denom: &str) -> BridgeResult<U256> {
        let balances = self.balances.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(balances
            .get(&(*account, denom.to_string()))
            .copied()
            .unwrap_or_default())
    }
}

impl Default for InMemoryTokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn mint_to(&self, account: &AccountAddress, amount: U256, denom: &str) -> BridgeResult<()> {
        let mut balances = self.balances.write().map_err(|_| StoreError::LockPoisoned)?;
        let balance = balances.entry((*account, denom.to_string())).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BridgeError::Invalid(format!("{denom} balance overflow")))?;
        Ok(())
    }

    fn burn_from(&self, account: &AccountAddress, amount: U256, denom: &str) -> BridgeResult<()> {
        let mut balances = self.balances.write().map_err(|_| StoreError::LockPoisoned)?;
        let key = (*account, denom.to_string());
        let current = balances.get(&key).copied().unwrap_or_default();
        let remaining = current.checked_sub(amount).ok_or_else(|| {
            BridgeError::Invalid(format!(
                "insufficient {denom}: have {current}, need {amount}"
            ))
        })?;
        balances.insert(key, remaining);
        Ok(())
    }
}
