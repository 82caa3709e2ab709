use crate::error::{BridgeError, BridgeResult, StoreError};
use crate::ports::ValidatorRegistry;
use peggy_types::{AccountAddress, ValidatorAddress};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Clone, Debug)]
struct RegistryEntry {
    power: u64,
    bonded: bool,
    orchestrator: AccountAddress,
}

/// In-memory staking registry for testing
pub struct InMemoryValidatorRegistry {
    validators: RwLock<BTreeMap<ValidatorAddress, RegistryEntry>>,
}

impl InMemoryValidatorRegistry {
    pub fn new() -> Self {
        Self {
            validators: RwLock::new(BTreeMap::new()),
        }
    }

    /// Bond `validator` with `power`, delegating to `orchestrator`.
    pub fn bond(
        &self,
        validator: ValidatorAddress,
        power: u64,
        orchestrator: AccountAddress,
    ) -> BridgeResult<()> {
        let mut validators = self.validators.write().map_err(|_| StoreError::LockPoisoned)?;
        validators.insert(
            validator,
            RegistryEntry {
                power,
                bonded: true,
                orchestrator,
            },
        );
        Ok(())
    }

    pub fn set_power(&self, validator: &ValidatorAddress, power: u64) -> BridgeResult<()> {
        let mut validators = self.validators.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = validators
            .get_mut(validator)
            .ok_or_else(|| BridgeError::NotFound(format!("validator {validator}")))?;
        entry.power = power;
        Ok(())
    }

    pub fn unbond(&self, validator: &ValidatorAddress) -> BridgeResult<()> {
        let mut validators = self.validators.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = validators
            .get_mut(validator)
            .ok_or_else(|| BridgeError::NotFound(format!("validator {validator}")))?;
        entry.bonded = false;
        Ok(())
    }
}

impl Default for InMemoryValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorRegistry for InMemoryValidatorRegistry {
    fn total_bonded_power(&self) -> BridgeResult<u64> {
        let validators = self.validators.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(validators
            .values()
            .filter(|e| e.bonded)
            .map(|e| e.power)
            .fold(0u64, u64::saturating_add))
    }

    fn power_of(&self, validator: &ValidatorAddress) -> BridgeResult<u64> {
        let validators = self.validators.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(validators
            .get(validator)
            .filter(|e| e.bonded)
            .map(|e| e.power)
            .unwrap_or(0))
    }

    fn resolve_orchestrator(
        &self,
        orchestrator: &AccountAddress,
    ) -> BridgeResult<Option<ValidatorAddress>> {
        let validators = self.validators.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(validators
            .iter()
            .find(|(_, e)| &e.orchestrator == orchestrator)
            .map(|(v, _)| *v))
    }

    fn is_bonded(&self, validator: &ValidatorAddress) -> BridgeResult<bool> {
        let validators = self.validators.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(validators.get(validator).is_some_and(|e| e.bonded))
    }

    fn bonded_validators(&self) -> BridgeResult<Vec<(ValidatorAddress, u64)>> {
        let validators = self.validators.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(validators
            .iter()
            .filter(|(_, e)| e.bonded)
            .map(|(v, e)| (*v, e.power))
            .collect())
    }
}
