//! Two-phase randomness protocol: a request that returns an id right away, and
//! a later callback carrying that id and the random words.

pub mod mock;

pub use mock::MockVrfCoordinator;

use crate::config::OracleConfig;
use crate::error::Result;
use crate::types::{Address, RequestId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a consumer asks the oracle for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    pub consumer: Address,
    pub key_hash: String,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn new(consumer: Address, oracle: &OracleConfig) -> Self {
        Self {
            consumer,
            key_hash: oracle.key_hash.clone(),
            subscription_id: oracle.subscription_id,
            request_confirmations: oracle.request_confirmations,
            callback_gas_limit: oracle.callback_gas_limit,
            num_words: oracle.num_words,
        }
    }
}

/// Outbound side. Must not call the consumer back before returning.
#[async_trait]
pub trait RandomnessOracle: Send + Sync {
    async fn request_randomness(&self, request: RandomnessRequest) -> Result<RequestId>;
}

/// Inbound side, invoked by the oracle on its own schedule.
#[async_trait]
pub trait RandomnessConsumer: Send + Sync {
    fn address(&self) -> Address;

    async fn on_randomness_fulfilled(
        &self,
        request_id: RequestId,
        random_words: Vec<u64>,
    ) -> Result<()>;
}
