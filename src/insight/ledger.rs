use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// Credits granted to a user the ledger has not seen before (Starter plan).
pub const STARTER_CREDITS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("no credits remaining for user {0}")]
    Exhausted(String),

    #[error("credit ledger unavailable: {0}")]
    Unavailable(String),
}

/// Per-user credit store. Implementations make `decrement` atomic with
/// respect to the balance it checks and return the fresh balance, so callers
/// never need a side channel to learn about changes.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn balance(&self, user_id: &str) -> Result<u32, LedgerError>;

    /// Spends one credit and returns what is left; fails with
    /// [`LedgerError::Exhausted`] when the balance is already zero.
    async fn decrement(&self, user_id: &str) -> Result<u32, LedgerError>;
}

#[derive(Debug)]
pub struct InMemoryCreditLedger {
    starting_credits: u32,
    balances: Mutex<HashMap<String, u32>>,
}

impl InMemoryCreditLedger {
    pub fn new(starting_credits: u32) -> Self {
        Self {
            starting_credits,
            balances: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_balance(&self, user_id: &str, credits: u32) -> Result<(), LedgerError> {
        let mut balances = self.lock()?;
        balances.insert(user_id.to_string(), credits);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, u32>>, LedgerError> {
        self.balances
            .lock()
            .map_err(|_| LedgerError::Unavailable("balance table lock poisoned".to_string()))
    }
}

impl Default for InMemoryCreditLedger {
    fn default() -> Self {
        Self::new(STARTER_CREDITS)
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn balance(&self, user_id: &str) -> Result<u32, LedgerError> {
        let balances = self.lock()?;
        Ok(balances
            .get(user_id)
            .copied()
            .unwrap_or(self.starting_credits))
    }

    async fn decrement(&self, user_id: &str) -> Result<u32, LedgerError> {
        let mut balances = self.lock()?;
        let balance = balances
            .entry(user_id.to_string())
            .or_insert(self.starting_credits);
        if *balance == 0 {
            return Err(LedgerError::Exhausted(user_id.to_string()));
        }
        *balance -= 1;
        Ok(*balance)
    }
}
