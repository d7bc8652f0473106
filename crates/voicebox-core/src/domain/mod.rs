//! Domain model (artifact names/refs, request ids, events, errors).

pub mod artifact;
pub mod errors;
pub mod events;
pub mod ids;

pub use self::artifact::{ArtifactMeta, ArtifactName, ArtifactRef};
pub use self::errors::{CacheError, ErrorKind, Result};
pub use self::events::CacheEvent;
pub use self::ids::RequestId;
