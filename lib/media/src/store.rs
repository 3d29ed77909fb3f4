//! Media storage behind a conditional-write trait.
//!
//! The store contract is "create if absent": writing a key that already
//! holds an object reports `AlreadyExists` instead of overwriting. The
//! uploader treats that as success, which is what makes redelivered
//! uploads idempotent.

use crate::error::MediaStoreError;
use async_nats::jetstream;
use async_nats::jetstream::object_store;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The object was written.
    Created,
    /// An object already existed under the key; nothing was written.
    AlreadyExists,
}

/// Trait for conditional-write object storage.
///
/// Implementations must guarantee that a key which already holds an object
/// yields `AlreadyExists` rather than an overwrite; callers rely on this
/// for redelivery idempotence. This abstraction allows testing without a
/// real bucket.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Writes the object unless the key already exists.
    async fn create_if_absent(
        &self,
        key: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<WriteOutcome, MediaStoreError>;

    /// Returns the stable URI for a key, independent of whether the write
    /// or the existence short-circuit produced it.
    fn object_uri(&self, key: &str) -> String;
}

/// NATS Object Store-backed media store.
pub struct ObjectBucketStore {
    store: object_store::ObjectStore,
    bucket: String,
}

impl ObjectBucketStore {
    /// Connects to NATS and opens (or creates) the media bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or bucket setup fails.
    pub async fn connect(url: &str, bucket: &str) -> Result<Self, MediaStoreError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| MediaStoreError::Unavailable {
                reason: format!("failed to connect: {e}"),
            })?;

        let jetstream = jetstream::new(client);
        let store = jetstream
            .create_object_store(object_store::Config {
                bucket: bucket.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|e| MediaStoreError::Unavailable {
                reason: format!("failed to open media bucket: {e}"),
            })?;

        Ok(Self {
            store,
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl MediaStore for ObjectBucketStore {
    async fn create_if_absent(
        &self,
        key: &str,
        _content_type: &str,
        data: &[u8],
    ) -> Result<WriteOutcome, MediaStoreError> {
        // The backend has no native compare-and-create, so the existence
        // check and the put are two calls. The deterministic key keeps the
        // race window harmless: a duplicate write stores identical bytes.
        match self.store.info(key).await {
            Ok(_) => return Ok(WriteOutcome::AlreadyExists),
            Err(e) if e.to_string().contains("not found") => {}
            Err(e) => {
                return Err(MediaStoreError::ExistenceCheckFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        self.store
            .put(key, &mut std::io::Cursor::new(data))
            .await
            .map_err(|e| MediaStoreError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(WriteOutcome::Created)
    }

    fn object_uri(&self, key: &str) -> String {
        format!("obj://{}/{}", self.bucket, key)
    }
}

/// In-memory media store for tests.
pub struct MemoryMediaStore {
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<u64>,
}

impl MemoryMediaStore {
    /// Creates an empty in-memory store with the given bucket name.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            writes: Mutex::new(0),
        }
    }

    /// Returns how many writes actually happened (existence short-circuits
    /// do not count).
    #[must_use]
    pub fn write_count(&self) -> u64 {
        *self.writes.lock().expect("write counter lock")
    }

    /// Returns the stored bytes for a key, if present.
    #[must_use]
    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().expect("object map lock").get(key).cloned()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn create_if_absent(
        &self,
        key: &str,
        _content_type: &str,
        data: &[u8],
    ) -> Result<WriteOutcome, MediaStoreError> {
        let mut objects = self.objects.lock().expect("object map lock");
        if objects.contains_key(key) {
            return Ok(WriteOutcome::AlreadyExists);
        }
        objects.insert(key.to_string(), data.to_vec());
        *self.writes.lock().expect("write counter lock") += 1;
        Ok(WriteOutcome::Created)
    }

    fn object_uri(&self, key: &str) -> String {
        format!("obj://{}/{}", self.bucket, key)
    }
}
