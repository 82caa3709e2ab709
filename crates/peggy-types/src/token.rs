//! ERC20 token amounts.

use crate::address::EthAddress;
use crate::errors::TypesError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A quantity of one external-chain fungible asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Erc20Token {
    pub amount: U256,
    pub symbol: String,
    pub contract: EthAddress,
}

impl Erc20Token {
    pub fn new(amount: impl Into<U256>, symbol: impl Into<String>, contract: EthAddress) -> Self {
        Self {
            amount: amount.into(),
            symbol: symbol.into(),
            contract,
        }
    }

    /// Zero amount of the same asset.
    pub fn zero_of(&self) -> Self {
        Self {
            amount: U256::zero(),
            symbol: self.symbol.clone(),
            contract: self.contract,
        }
    }

    /// Contract must be non-empty and the symbol present.
    pub fn validate(&self) -> Result<(), TypesError> {
        self.contract.ensure_non_empty()?;
        if self.symbol.trim().is_empty() {
            return Err(TypesError::InvalidToken("empty symbol".into()));
        }
        Ok(())
    }

    pub fn same_asset(&self, other: &Erc20Token) -> bool {
        self.contract == other.contract && self.symbol == other.symbol
    }

    /// Sum of two amounts of the same asset.
    pub fn checked_add(&self, other: &Erc20Token) -> Result<Erc20Token, TypesError> {
        if !self.same_asset(other) {
            return Err(TypesError::InvalidToken(format!(
                "cannot add {} of {} to {} of {}",
                other.symbol, other.contract, self.symbol, self.contract
            )));
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| TypesError::InvalidToken("amount overflow".into()))?;
        Ok(Erc20Token {
            amount,
            symbol: self.symbol.clone(),
            contract: self.contract,
        })
    }
}
