//! Recording mocks for the aggregator and chain ports.
//!
//! Used by the pipeline unit and integration tests. Every call is appended
//! to a log so tests can assert both *what* happened and in *which order*.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;

use super::aggregator::{
    AggregatorError, AggregatorPort, AssembledSwap, QuoteParams, QuoteSummary,
};
use super::chain::{ChainError, ChainPort};

/// Hash handed out for approve transactions.
pub const APPROVE_TX: TxHash = TxHash::with_last_byte(0x01);
/// Hash handed out for the swap transaction.
pub const SWAP_TX: TxHash = TxHash::with_last_byte(0x02);
/// Hash handed out for forward transfers.
pub const TRANSFER_TX: TxHash = TxHash::with_last_byte(0x03);

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Mock aggregator with canned responses.
pub struct MockAggregator {
    log: CallLog,
    router: Address,
    path_id: String,
    amount_out: Option<U256>,
    fail_quote: bool,
    assembled: AssembledSwap,
}

impl MockAggregator {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            router: Address::with_last_byte(0xAA),
            path_id: "path-1".to_string(),
            amount_out: Some(U256::from(900u64)),
            fail_quote: false,
            assembled: AssembledSwap {
                to: Address::with_last_byte(0xAA),
                data: Bytes::from(vec![0xde, 0xad]),
                value: U256::ZERO,
            },
        }
    }

    pub fn with_amount_out(mut self, amount_out: Option<U256>) -> Self {
        self.amount_out = amount_out;
        self
    }

    pub fn with_quote_failure(mut self) -> Self {
        self.fail_quote = true;
        self
    }

    pub fn router(&self) -> Address {
        self.router
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl AggregatorPort for MockAggregator {
    async fn router_address(&self) -> Result<Address, AggregatorError> {
        self.record("router");
        Ok(self.router)
    }

    async fn quote(&self, params: &QuoteParams) -> Result<QuoteSummary, AggregatorError> {
        self.record(format!("quote:{}", params.amount_in));
        if self.fail_quote {
            return Err(AggregatorError::NoRoute);
        }
        Ok(QuoteSummary {
            path_id: self.path_id.clone(),
            amount_out: self.amount_out,
        })
    }

    async fn assemble(
        &self,
        path_id: &str,
        _user: Address,
        simulate: bool,
    ) -> Result<AssembledSwap, AggregatorError> {
        self.record(format!("assemble:{}:{}", path_id, simulate));
        Ok(self.assembled.clone())
    }
}

/// Mock chain with in-memory balances and allowances.
pub struct MockChain {
    log: CallLog,
    wallet: Address,
    native: U256,
    decimals: Mutex<HashMap<Address, u8>>,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    reverting: Mutex<HashSet<TxHash>>,
}

impl MockChain {
    pub fn new(log: CallLog, wallet: Address) -> Self {
        Self {
            log,
            wallet,
            native: U256::from(10u64).pow(U256::from(18u64)),
            decimals: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            reverting: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_decimals(self, token: Address, decimals: u8) -> Self {
        self.decimals.lock().unwrap().insert(token, decimals);
        self
    }

    pub fn with_balance(self, token: Address, owner: Address, balance: U256) -> Self {
        self.balances.lock().unwrap().insert((token, owner), balance);
        self
    }

    pub fn with_allowance(self, token: Address, spender: Address, value: U256) -> Self {
        self.allowances.lock().unwrap().insert((token, spender), value);
        self
    }

    /// Make the given transaction hash revert when waited on.
    pub fn with_reverting_tx(self, hash: TxHash) -> Self {
        self.reverting.lock().unwrap().insert(hash);
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl ChainPort for MockChain {
    fn wallet_address(&self) -> Address {
        self.wallet
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        self.record("native_balance");
        Ok(self.native)
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, ChainError> {
        self.record("decimals");
        self.decimals
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::Rpc(format!("no decimals configured for {token}")))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.record("balance");
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn allowance(
        &self,
        token: Address,
        _owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.record("allowance");
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(token, spender))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        value: U256,
    ) -> Result<TxHash, ChainError> {
        self.record("approve");
        self.allowances
            .lock()
            .unwrap()
            .insert((token, spender), value);
        Ok(APPROVE_TX)
    }

    async fn transfer(
        &self,
        _token: Address,
        to: Address,
        value: U256,
    ) -> Result<TxHash, ChainError> {
        self.record(format!("transfer:{to}:{value}"));
        Ok(TRANSFER_TX)
    }

    async fn send_call(
        &self,
        _to: Address,
        _data: Bytes,
        _value: U256,
        _gas_fallback: u64,
    ) -> Result<TxHash, ChainError> {
        self.record("swap");
        Ok(SWAP_TX)
    }

    async fn wait_for_success(&self, hash: TxHash) -> Result<u64, ChainError> {
        self.record("wait");
        if self.reverting.lock().unwrap().contains(&hash) {
            return Err(ChainError::Reverted(hash));
        }
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_chain_records_calls() {
        let log = CallLog::default();
        let token = Address::with_last_byte(1);
        let wallet = Address::with_last_byte(2);
        let chain = MockChain::new(log.clone(), wallet)
            .with_decimals(token, 6)
            .with_balance(token, wallet, U256::from(42u64));

        assert_eq!(chain.token_decimals(token).await.unwrap(), 6);
        assert_eq!(
            chain.token_balance(token, wallet).await.unwrap(),
            U256::from(42u64)
        );
        assert_eq!(*log.lock().unwrap(), vec!["decimals", "balance"]);
    }

    #[tokio::test]
    async fn test_mock_chain_reverting_tx() {
        let log = CallLog::default();
        let chain =
            MockChain::new(log, Address::with_last_byte(2)).with_reverting_tx(SWAP_TX);

        assert!(matches!(
            chain.wait_for_success(SWAP_TX).await,
            Err(ChainError::Reverted(_))
        ));
        assert_eq!(chain.wait_for_success(APPROVE_TX).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mock_aggregator_quote_failure() {
        let log = CallLog::default();
        let agg = MockAggregator::new(log).with_quote_failure();
        let params = QuoteParams {
            token_in: Address::with_last_byte(1),
            token_out: Address::with_last_byte(2),
            amount_in: U256::from(100u64),
            slippage_percent: rust_decimal_macros::dec!(0.5),
            user: Address::with_last_byte(3),
        };

        assert!(matches!(
            agg.quote(&params).await,
            Err(AggregatorError::NoRoute)
        ));
    }
}
