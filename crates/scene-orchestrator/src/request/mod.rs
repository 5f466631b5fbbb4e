//! # Request Builders
//!
//! A request is a tree: one self-action (load or unload a scene) plus ordered
//! sub-requests added with `with`. Builders are consumed by `apply()`, so a
//! request can be applied once only.
//!
//! ```rust,ignore
//! client
//!     .load("Level1", LoadMode::Exclusive)
//!     .tag(["level"])
//!     .data(LevelConfig { difficulty: 2 })
//!     .with("Hud")
//!     .with_request("Ambience", |r| r.tag(["audio"]))
//!     .on_complete(|level| info!(id = %level.id, "Level ready"))
//!     .on_fail(|e| warn!(error = %e, "Level failed"))
//!     .apply()
//!     .await?;
//! ```
//!
//! Here `Level1` loads first; `Hud` and then `Ambience` load after it, one
//! after the other, and both receive the `LevelConfig` payload. The
//! `on_complete` handler runs once all three are loaded.

mod load;
mod unload;

pub use load::LoadRequest;
pub use unload::UnloadRequest;
