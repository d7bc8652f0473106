//! voicebox-core
//!
//! Bounded cache of uploaded voice recordings.
//!
//! Artifacts are persisted through an [`ports::ArtifactStore`] and tracked by
//! an in-memory [`index::EvictionIndex`]. When the number of resident
//! artifacts reaches capacity, the smallest (and among equals, the oldest)
//! artifact is deleted before the new one is admitted.
//!
//! # Modules
//! - **domain**: artifact names/refs, request ids, events, errors
//! - **ports**: store, clock, codec, id generator and event sink traits
//! - **index**: the eviction priority index
//! - **impls**: filesystem and in-memory stores, mp3 codec, recording sink
//! - **app**: cache manager, builder, config, transport, stats

pub mod domain;
pub mod ports;
pub mod index;
pub mod impls;
pub mod app;
