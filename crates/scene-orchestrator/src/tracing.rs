//! # Observability & Tracing
//!
//! The runtime logs through `tracing` with structured fields:
//!
//! - **Runtime lifecycle**: start, shutdown with the number of active scenes
//!   and abandoned request nodes
//! - **Requests**: accepted loads/unloads (`scene`, `mode`, `id`), completion,
//!   failures with the error
//! - **Reconciliation**: loaded/unloaded events, adopted scenes (`tag` is
//!   `root` or `unknown`), scenes unloaded outside the runtime
//! - **Invariant violations**: duplicate completion signals at `error` level
//!
//! ```bash
//! # Lifecycle and reconciliation
//! RUST_LOG=info cargo run
//!
//! # Full request plans as they are applied
//! RUST_LOG=debug cargo run
//!
//! # Only the runtime
//! RUST_LOG=scene_orchestrator::runtime=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a two-scene request looks like:
//!
//! ```text
//! INFO Load request accepted scene="Level1" mode=Additive
//! INFO Scene loaded id=scene_1 scene="Level1" size=1
//! INFO Load request accepted scene="Hud" mode=Additive
//! INFO Scene loaded id=scene_2 scene="Hud" size=2
//! INFO Load request complete scene="Hud" id=scene_2
//! INFO Load request complete scene="Level1" id=scene_1
//! ```

/// Installs a compact `tracing-subscriber` formatter filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
