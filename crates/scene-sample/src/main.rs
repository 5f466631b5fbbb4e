//! # Scene Orchestrator Sample
//!
//! Runs a [`SceneSystem`] against a simulated engine:
//! 1.  The engine loads a boot scene on its own, which the runtime adopts.
//! 2.  A level is loaded exclusively with its HUD and audio as parallel
//!     sub-scenes, sharing one level description.
//! 3.  Everything tagged as gameplay is unloaded again.
//!
//! `RUST_LOG=debug` shows every loader call and event.

use scene_orchestrator::tracing::setup_tracing;
use scene_orchestrator::LoadMode;
use scene_sample::lifecycle::{SceneSystem, SystemConfig, SystemError};
use std::time::Duration;
use tracing::{error, info, Instrument};

#[derive(Debug)]
struct LevelInfo {
    title: &'static str,
    difficulty: u8,
}

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    setup_tracing();

    info!("Starting scene system");
    let system = SceneSystem::new(SystemConfig::default());

    let boot = system.loader.load_external("Bootstrap").await;
    info!(scene_id = %boot, "Engine booted");

    let span = tracing::info_span!("level_load");
    let level = async {
        info!("Loading level with sub-scenes");
        system
            .client
            .load("Level1", LoadMode::Exclusive)
            .tag(["gameplay"])
            .data(LevelInfo {
                title: "The First Level",
                difficulty: 2,
            })
            .with_request("Hud", |hud| hud.tag(["gameplay", "ui"]))
            .with_request("Audio", |audio| audio.tag(["gameplay"]))
            .parallel()
            .apply_and_wait()
            .await
    }
    .instrument(span)
    .await;

    match level {
        Ok(level) => {
            info!(scene_id = %level.id, "Level ready");
            if let Some(info) = level.data::<LevelInfo>()? {
                info!(title = info.title, difficulty = info.difficulty, "Level data");
            }
        }
        Err(e) => error!(error = %e, "Level load failed"),
    }

    for scene in system.client.scenes().await? {
        info!(scene_id = %scene.id, name = %scene.name, tags = ?scene.tags, "Active scene");
    }

    let span = tracing::info_span!("gameplay_unload");
    async {
        let ids = system.client.unload_by_tag("gameplay").await?;
        info!(count = ids.len(), "Unloading gameplay scenes");
        while !system.client.pending().await?.unloads.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok::<_, SystemError>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await?;

    info!("Sample completed successfully");
    Ok(())
}
