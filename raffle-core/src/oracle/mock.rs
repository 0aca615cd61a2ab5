use super::{RandomnessConsumer, RandomnessOracle, RandomnessRequest};
use crate::config::MAX_NUM_WORDS;
use crate::error::{RaffleError, Result};
use crate::types::{Address, RequestId};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct CoordinatorState {
    last_request_id: u64,
    consumers: HashSet<Address>,
    pending: HashMap<RequestId, RandomnessRequest>,
}

/// In-process randomness coordinator for local networks and tests.
///
/// Requests are held until someone calls one of the `fulfill_*` methods,
/// which is how a test plays the part of the oracle node.
#[derive(Debug, Default)]
pub struct MockVrfCoordinator {
    state: Mutex<CoordinatorState>,
}

impl MockVrfCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_consumer(&self, consumer: Address) {
        self.state.lock().consumers.insert(consumer);
        tracing::debug!("Coordinator registered consumer {}", consumer);
    }

    pub fn remove_consumer(&self, consumer: Address) {
        self.state.lock().consumers.remove(&consumer);
    }

    pub fn is_consumer(&self, consumer: Address) -> bool {
        self.state.lock().consumers.contains(&consumer)
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.state.lock().pending.contains_key(&request_id)
    }

    pub fn pending_requests(&self) -> Vec<RequestId> {
        let mut ids: Vec<RequestId> = self.state.lock().pending.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Deliver words derived from the request id
    pub async fn fulfill_random_words(
        &self,
        request_id: RequestId,
        consumer: &dyn RandomnessConsumer,
    ) -> Result<()> {
        let num_words = self.pending_request(request_id)?.num_words;
        let words = derive_words(request_id, num_words);
        self.fulfill_random_words_with_override(request_id, consumer, words)
            .await
    }

    /// Deliver caller-chosen words
    pub async fn fulfill_random_words_with_override(
        &self,
        request_id: RequestId,
        consumer: &dyn RandomnessConsumer,
        words: Vec<u64>,
    ) -> Result<()> {
        let request = self.pending_request(request_id)?;

        if request.consumer != consumer.address() {
            return Err(RaffleError::oracle(format!(
                "invalid consumer {} for request {}",
                consumer.address(),
                request_id
            )));
        }

        if words.len() != request.num_words as usize {
            return Err(RaffleError::oracle(format!(
                "expected {} random words, got {}",
                request.num_words,
                words.len()
            )));
        }

        // lock is released while the consumer runs
        consumer.on_randomness_fulfilled(request_id, words).await?;

        self.state.lock().pending.remove(&request_id);
        tracing::debug!("Coordinator fulfilled request {}", request_id);
        Ok(())
    }

    fn pending_request(&self, request_id: RequestId) -> Result<RandomnessRequest> {
        self.state
            .lock()
            .pending
            .get(&request_id)
            .cloned()
            .ok_or_else(|| RaffleError::oracle(format!("nonexistent request {}", request_id)))
    }
}

#[async_trait]
impl RandomnessOracle for MockVrfCoordinator {
    async fn request_randomness(&self, request: RandomnessRequest) -> Result<RequestId> {
        if request.num_words == 0 || request.num_words > MAX_NUM_WORDS {
            return Err(RaffleError::oracle(format!(
                "num words {} outside 1..={}",
                request.num_words, MAX_NUM_WORDS
            )));
        }

        let mut state = self.state.lock();
        if !state.consumers.contains(&request.consumer) {
            return Err(RaffleError::oracle(format!(
                "invalid consumer {}",
                request.consumer
            )));
        }

        state.last_request_id += 1;
        let request_id = RequestId(state.last_request_id);
        tracing::debug!(
            "Coordinator accepted request {} from {} ({} words)",
            request_id,
            request.consumer,
            request.num_words
        );
        state.pending.insert(request_id, request);

        Ok(request_id)
    }
}

fn derive_words(request_id: RequestId, num_words: u32) -> Vec<u64> {
    (0..num_words)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update(request_id.0.to_be_bytes());
            hasher.update(i.to_be_bytes());
            let digest = hasher.finalize();
            let mut word = [0u8; 8];
            word.copy_from_slice(&digest[..8]);
            u64::from_be_bytes(word)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleConfig;
    use parking_lot::Mutex as SyncMutex;

    struct RecordingConsumer {
        address: Address,
        received: SyncMutex<Vec<(RequestId, Vec<u64>)>>,
        reject: bool,
    }

    impl RecordingConsumer {
        fn new(n: u64) -> Self {
            Self {
                address: Address::from_low_u64(n),
                received: SyncMutex::new(Vec::new()),
                reject: false,
            }
        }
    }

    #[async_trait]
    impl RandomnessConsumer for RecordingConsumer {
        fn address(&self) -> Address {
            self.address
        }

        async fn on_randomness_fulfilled(
            &self,
            request_id: RequestId,
            random_words: Vec<u64>,
        ) -> Result<()> {
            if self.reject {
                return Err(RaffleError::payout("rejected"));
            }
            self.received.lock().push((request_id, random_words));
            Ok(())
        }
    }

    fn request_for(consumer: &RecordingConsumer) -> RandomnessRequest {
        RandomnessRequest::new(consumer.address, &OracleConfig::default())
    }

    #[tokio::test]
    async fn test_sequential_request_ids() {
        let coordinator = MockVrfCoordinator::new();
        let consumer = RecordingConsumer::new(1);
        coordinator.add_consumer(consumer.address);

        let first = coordinator.request_randomness(request_for(&consumer)).await.unwrap();
        let second = coordinator.request_randomness(request_for(&consumer)).await.unwrap();

        assert_eq!(first, RequestId(1));
        assert_eq!(second, RequestId(2));
        assert_eq!(coordinator.pending_requests(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_unregistered_consumer_cannot_request() {
        let coordinator = MockVrfCoordinator::new();
        let consumer = RecordingConsumer::new(1);

        let err = coordinator
            .request_randomness(request_for(&consumer))
            .await
            .unwrap_err();
        assert!(matches!(err, RaffleError::Oracle(_)));
        assert!(coordinator.pending_requests().is_empty());
    }

    #[tokio::test]
    async fn test_nonexistent_request() {
        let coordinator = MockVrfCoordinator::new();
        let consumer = RecordingConsumer::new(1);

        let err = coordinator
            .fulfill_random_words(RequestId(0), &consumer)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nonexistent request"));
        assert!(consumer.received.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fulfill_delivers_once() {
        let coordinator = MockVrfCoordinator::new();
        let consumer = RecordingConsumer::new(1);
        coordinator.add_consumer(consumer.address);
        let id = coordinator.request_randomness(request_for(&consumer)).await.unwrap();

        coordinator.fulfill_random_words(id, &consumer).await.unwrap();
        assert!(!coordinator.is_pending(id));

        let received = consumer.received.lock().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, id);
        assert_eq!(received[0].1, derive_words(id, 1));

        assert!(coordinator.fulfill_random_words(id, &consumer).await.is_err());
    }

    #[tokio::test]
    async fn test_foreign_consumer_rejected() {
        let coordinator = MockVrfCoordinator::new();
        let owner = RecordingConsumer::new(1);
        let stranger = RecordingConsumer::new(2);
        coordinator.add_consumer(owner.address);
        let id = coordinator.request_randomness(request_for(&owner)).await.unwrap();

        let err = coordinator
            .fulfill_random_words_with_override(id, &stranger, vec![7])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid consumer"));
        assert!(coordinator.is_pending(id));
        assert!(stranger.received.lock().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_callback_stays_pending() {
        let coordinator = MockVrfCoordinator::new();
        let mut consumer = RecordingConsumer::new(1);
        consumer.reject = true;
        coordinator.add_consumer(consumer.address);
        let id = coordinator.request_randomness(request_for(&consumer)).await.unwrap();

        assert!(coordinator
            .fulfill_random_words_with_override(id, &consumer, vec![7])
            .await
            .is_err());
        assert!(coordinator.is_pending(id));

        assert!(coordinator
            .fulfill_random_words_with_override(id, &consumer, vec![7, 8])
            .await
            .is_err());
    }

    #[test]
    fn test_derived_words_are_deterministic() {
        let a = derive_words(RequestId(1), 3);
        assert_eq!(a.len(), 3);
        assert_eq!(a, derive_words(RequestId(1), 3));
        assert_ne!(a, derive_words(RequestId(2), 3));
    }
}
