//! Scene storage.
//!
//! A flat store of entities, each optionally carrying one transform.
//! There is no removal: entities and components live until the store is
//! dropped, matching the lifetime of the demo loop.

mod store;

pub use store::{EntityId, Scene, SceneConfig};
