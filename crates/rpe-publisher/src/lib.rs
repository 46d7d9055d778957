//! Signed parameter publication.
//!
//! Samples engine snapshots, signs them with the publisher key, and
//! broadcasts them on a configured channel. Publishes on a fixed
//! interval and immediately on regime flips or large toxicity moves.

pub mod error;
pub mod key;
pub mod publisher;
pub mod transport;
pub mod update;

pub use error::{PublishError, PublishResult};
pub use key::{load_signer, KeySource};
pub use publisher::{Publisher, PublisherConfig};
pub use transport::{BoxFuture, BroadcastTransport, LoggingTransport, RecordingTransport};
pub use update::{ParameterUpdate, SignedParameterUpdate};
