//! Text classification for incoming complaints.
//!
//! [`MlService`] ties together a bounded [`ModelPool`], per-process
//! [`AdmissionControl`] and a [`TtlCache`] of past results.

pub mod admission;
pub mod cache;
pub mod classifier;
pub mod error;
pub mod pool;
pub mod returns;
pub mod service;

pub use admission::{AdmissionControl, AdmissionPermit};
pub use cache::{CacheStore, MemoryStore, TtlCache};
#[cfg(feature = "redis")]
pub use cache::RedisStore;
pub use classifier::{HttpClassifier, HttpModelLoader, ModelLoader, TextClassifier};
pub use error::{MlError, Result};
pub use pool::{ModelPool, PoolStatus};
pub use returns::{apply_return_override, is_return_request, DEFAULT_RETURN_CONFIDENCE, DEFAULT_RETURN_KEYWORDS};
pub use service::{ClassifiedText, MlService, MlSettings, MlStatus, RESULT_NAMESPACE};
