// Data availability layer: transports and the sequence adapter.
//
// Two interchangeable transports sit behind the adapter:
// - `Transport::Store`: plain store/fetch keyed by an opaque reference
// - `Transport::Disperser`: submit/poll/retrieve against an asynchronous
//   dispersal service, driven by `dispersal::disperse`

pub mod dispersal;
pub mod disperser;
pub mod store;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::batch;
use crate::commitment::{self, CommitmentVersion};
use crate::config::{DaConfig, TransportKind};
use crate::error::{DaError, Result};
use crate::packing;
use crate::types::{Batch, BlobReference, DispersalReceipt, StatusReply, SubmitReply};
use crate::utils::{blob_digest, to_hex_prefixed};

pub use dispersal::PollPolicy;
pub use disperser::GrpcDisperser;
pub use store::HttpBlobStore;

/// Store/fetch storage keyed by a reference the store hands out
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `data`, returning the reference to fetch it with
    async fn store(&self, data: &[u8]) -> Result<Vec<u8>>;
    async fn fetch(&self, reference: &[u8]) -> Result<Vec<u8>>;
}

/// Asynchronous dispersal job API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Disperser: Send + Sync {
    async fn submit(&self, data: Vec<u8>) -> Result<SubmitReply>;
    async fn poll(&self, receipt: &DispersalReceipt) -> Result<StatusReply>;
    async fn retrieve(&self, reference: &BlobReference) -> Result<Vec<u8>>;
}

/// Transport selected at configuration time
#[derive(Clone)]
pub enum Transport {
    Store(Arc<dyn BlobStore>),
    Disperser(Arc<dyn Disperser>),
}

impl Transport {
    pub fn from_config(config: &DaConfig) -> Result<Self> {
        Ok(match config.transport {
            TransportKind::Store => Transport::Store(Arc::new(HttpBlobStore::new(&config.rpc))),
            TransportKind::Disperser => {
                Transport::Disperser(Arc::new(GrpcDisperser::connect_lazy(&config.rpc)?))
            }
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Transport::Store(_) => "store",
            Transport::Disperser(_) => "disperser",
        }
    }
}

/// Capability the sequencer expects from a data availability backend
#[async_trait]
pub trait DataAvailability: Send + Sync {
    async fn init(&self) -> Result<()>;

    /// Post an ordered batch set, returning the commitment to put on-chain
    async fn post_sequence(&self, batches: &[Batch], cancel: &CancellationToken)
        -> Result<Vec<u8>>;

    /// Recover the batch set behind `commitment`.
    /// `batch_hashes` are accepted for future content checks and not verified.
    async fn get_sequence(
        &self,
        batch_hashes: &[[u8; 32]],
        commitment: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<Batch>>;
}

/// Sequence adapter over a configured transport.
/// Holds no per-call state, so one instance can serve concurrent calls.
#[derive(Clone)]
pub struct DaAdapter {
    transport: Transport,
    policy: PollPolicy,
}

impl DaAdapter {
    pub fn new(transport: Transport, policy: PollPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn from_config(config: &DaConfig) -> Result<Self> {
        Ok(Self::new(
            Transport::from_config(config)?,
            config.poll_policy(),
        ))
    }

}

#[async_trait]
impl DataAvailability for DaAdapter {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn post_sequence(
        &self,
        batches: &[Batch],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let aggregate = batch::serialize(batches);
        debug!(
            "📦 Sending sequence of {} batches ({} bytes, digest {}) via {}",
            batches.len(),
            aggregate.len(),
            blob_digest(&aggregate),
            self.transport.name()
        );

        let reference = match &self.transport {
            Transport::Store(store) => {
                dispersal::cancellable(cancel, store.store(&aggregate)).await?
            }
            Transport::Disperser(disperser) => {
                let payload = packing::pack(&aggregate);
                dispersal::disperse(disperser.as_ref(), payload, &self.policy, cancel)
                    .await?
                    .to_rlp_bytes()
            }
        };

        let commitment = commitment::encode(&reference, CommitmentVersion::CURRENT.as_byte());
        info!(
            "📡 Posted {} batches, commitment {}",
            batches.len(),
            to_hex_prefixed(&commitment)
        );
        Ok(commitment)
    }

    async fn get_sequence(
        &self,
        batch_hashes: &[[u8; 32]],
        commitment: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Vec<Batch>> {
        let (version, reference) = commitment::decode(commitment)?;
        match CommitmentVersion::try_from(version)? {
            CommitmentVersion::V0 => {}
        }
        debug!(
            "Fetching sequence for commitment {} ({} expected batch hashes)",
            to_hex_prefixed(commitment),
            batch_hashes.len()
        );

        let aggregate = match &self.transport {
            Transport::Store(store) => dispersal::cancellable(cancel, store.fetch(reference)).await?,
            Transport::Disperser(disperser) => {
                let reference = BlobReference::from_rlp_bytes(reference)
                    .map_err(|e| DaError::InvalidCommitment(format!("blob reference: {e}")))?;
                let blob = dispersal::cancellable(cancel, disperser.retrieve(&reference)).await?;
                packing::unpack(&blob)
            }
        };

        let batches = batch::deserialize(&aggregate)?;
        debug!(
            "Recovered {} batches from {} bytes (digest {})",
            batches.len(),
            aggregate.len(),
            blob_digest(&aggregate)
        );
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlobStatus, StatusReply, SubmitReply};
    use std::time::Duration;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(1);

    fn policy() -> PollPolicy {
        PollPolicy {
            timeout: INTERVAL * 30,
            retry_interval: INTERVAL,
            max_transient_errors: None,
        }
    }

    fn batches() -> Vec<Batch> {
        vec![b"".to_vec(), b"abc".to_vec(), b"hello world".to_vec()]
    }

    fn reference() -> BlobReference {
        BlobReference {
            batch_header_hash: vec![0x5a; 32].into(),
            blob_index: 3,
        }
    }

    /// Transport whose reads never complete
    struct StalledTransport;

    #[async_trait]
    impl BlobStore for StalledTransport {
        async fn store(&self, _data: &[u8]) -> Result<Vec<u8>> {
            std::future::pending().await
        }

        async fn fetch(&self, _reference: &[u8]) -> Result<Vec<u8>> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl Disperser for StalledTransport {
        async fn submit(&self, _data: Vec<u8>) -> Result<SubmitReply> {
            std::future::pending().await
        }

        async fn poll(&self, _receipt: &DispersalReceipt) -> Result<StatusReply> {
            std::future::pending().await
        }

        async fn retrieve(&self, _reference: &BlobReference) -> Result<Vec<u8>> {
            std::future::pending().await
        }
    }

    fn cancel_after(delay: Duration) -> CancellationToken {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trigger.cancel();
        });
        cancel
    }

    fn store_adapter(store: MockBlobStore) -> DaAdapter {
        DaAdapter::new(Transport::Store(Arc::new(store)), policy())
    }

    fn disperser_adapter(disperser: MockDisperser) -> DaAdapter {
        DaAdapter::new(Transport::Disperser(Arc::new(disperser)), policy())
    }

    #[tokio::test]
    async fn test_init_is_noop() {
        let adapter = store_adapter(MockBlobStore::new());
        assert!(adapter.init().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_sequence_via_disperser() {
        let expected_payload = packing::pack(&batch::serialize(&batches()));
        let mut disperser = MockDisperser::new();
        disperser
            .expect_submit()
            .withf(move |data| data == &expected_payload)
            .times(1)
            .returning(|_| {
                Ok(SubmitReply {
                    status: BlobStatus::Processing,
                    receipt: DispersalReceipt {
                        request_id: vec![9; 16],
                    },
                })
            });
        let mut polls = 0;
        disperser.expect_poll().times(3).returning(move |_| {
            polls += 1;
            Ok(if polls < 3 {
                StatusReply {
                    status: BlobStatus::Processing,
                    reference: None,
                }
            } else {
                StatusReply {
                    status: BlobStatus::Confirmed,
                    reference: Some(reference()),
                }
            })
        });

        let adapter = disperser_adapter(disperser);
        let start = Instant::now();
        let commitment = adapter
            .post_sequence(&batches(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), INTERVAL * 3);
        let mut expected = vec![CommitmentVersion::V0.as_byte()];
        expected.extend_from_slice(&reference().to_rlp_bytes());
        assert_eq!(commitment, expected);
    }

    #[tokio::test]
    async fn test_get_sequence_via_disperser() {
        let blob = packing::pack(&batch::serialize(&batches()));
        let mut disperser = MockDisperser::new();
        disperser
            .expect_retrieve()
            .withf(|r| BlobReference::clone(r) == reference())
            .times(1)
            .returning(move |_| Ok(blob.clone()));

        let adapter = disperser_adapter(disperser);
        let commitment = commitment::encode(&reference().to_rlp_bytes(), 0x00);
        let recovered = adapter
            .get_sequence(&[[0u8; 32]; 3], &commitment, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(recovered, batches());
    }

    #[tokio::test]
    async fn test_get_sequence_rejects_garbage_reference() {
        let mut disperser = MockDisperser::new();
        disperser.expect_retrieve().times(0);
        let adapter = disperser_adapter(disperser);

        let result = adapter
            .get_sequence(&[], &[0x00, 0x83, b'a'], &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(DaError::InvalidCommitment(_))));
    }

    #[tokio::test]
    async fn test_post_and_get_via_store() {
        let aggregate = batch::serialize(&batches());
        let stored = aggregate.clone();
        let mut store = MockBlobStore::new();
        store
            .expect_store()
            .withf(move |data| data.to_vec() == stored)
            .times(1)
            .returning(|_| Ok(b"key-1".to_vec()));
        store
            .expect_fetch()
            .withf(|reference| reference.to_vec() == b"key-1")
            .times(1)
            .returning(move |_| Ok(aggregate.clone()));

        let adapter = store_adapter(store);
        let cancel = CancellationToken::new();
        let commitment = adapter.post_sequence(&batches(), &cancel).await.unwrap();
        assert_eq!(commitment, b"\x00key-1".to_vec());

        let recovered = adapter.get_sequence(&[], &commitment, &cancel).await.unwrap();
        assert_eq!(recovered, batches());
    }

    #[tokio::test]
    async fn test_get_sequence_propagates_not_found() {
        let mut store = MockBlobStore::new();
        store.expect_fetch().times(1).returning(|reference| {
            Err(DaError::NotFound {
                reference: to_hex_prefixed(reference),
            })
        });

        let adapter = store_adapter(store);
        let result = adapter
            .get_sequence(&[], b"\x00missing", &CancellationToken::new())
            .await;
        match result {
            Err(DaError::NotFound { reference }) => {
                assert_eq!(reference, to_hex_prefixed(b"missing"))
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_sequence_rejects_bad_commitments() {
        let mut store = MockBlobStore::new();
        store.expect_fetch().times(0);
        let adapter = store_adapter(store);
        let cancel = CancellationToken::new();

        assert!(matches!(
            adapter.get_sequence(&[], &[], &cancel).await,
            Err(DaError::InvalidCommitment(_))
        ));
        assert!(matches!(
            adapter.get_sequence(&[], &[0x07, 1, 2], &cancel).await,
            Err(DaError::UnsupportedVersion(0x07))
        ));
    }

    #[tokio::test]
    async fn test_malformed_aggregate_from_store() {
        let mut store = MockBlobStore::new();
        store
            .expect_fetch()
            .returning(|_| Ok(b"not rlp at all".to_vec()));

        let adapter = store_adapter(store);
        let result = adapter
            .get_sequence(&[], b"\x00ref", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(DaError::MalformedAggregate { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_store() {
        let mut store = MockBlobStore::new();
        store.expect_store().returning(|_| Ok(b"key".to_vec()));

        let adapter = store_adapter(store);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = adapter.post_sequence(&batches(), &cancel).await;
        assert!(matches!(result, Err(DaError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_in_flight_fetch() {
        let adapter = DaAdapter::new(Transport::Store(Arc::new(StalledTransport)), policy());
        let cancel = cancel_after(INTERVAL * 2);

        let start = Instant::now();
        let result = adapter.get_sequence(&[], b"\x00key-1", &cancel).await;
        assert!(matches!(result, Err(DaError::Cancelled)));
        assert_eq!(start.elapsed(), INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_in_flight_retrieve() {
        let adapter = DaAdapter::new(Transport::Disperser(Arc::new(StalledTransport)), policy());
        let cancel = cancel_after(INTERVAL * 2);
        let commitment = commitment::encode(&reference().to_rlp_bytes(), 0x00);

        let start = Instant::now();
        let result = adapter.get_sequence(&[], &commitment, &cancel).await;
        assert!(matches!(result, Err(DaError::Cancelled)));
        assert_eq!(start.elapsed(), INTERVAL * 2);
    }
}
