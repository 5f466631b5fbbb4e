use scene_orchestrator::mock::{start_mock_runtime, LoaderCall, MockRuntime};
use scene_orchestrator::{LoadMode, SceneClient, SceneData, SceneError, SceneId, StaticCatalog};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

fn catalog() -> StaticCatalog {
    StaticCatalog::new(["Level1", "Hud", "Audio", "Minimap", "Lights", "Menu"])
}

fn load_call(name: &str) -> LoaderCall {
    LoaderCall::Load {
        name: name.to_string(),
        mode: LoadMode::Additive,
    }
}

/// Every command sent before this one has been fully handled once it returns.
async fn settle(client: &SceneClient) {
    client.pending().await.expect("runtime alive");
}

async fn assert_no_call(harness: &mut MockRuntime) {
    settle(&harness.client).await;
    assert_eq!(harness.probe.try_next_call(), None);
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Load of a single scene completes once, only after the loader reports it.
#[tokio::test]
async fn test_leaf_load_completes_after_loaded_event() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let on_done = log.clone();
    harness
        .client
        .load("Level1", LoadMode::Additive)
        .on_complete(move |scene| {
            on_done
                .lock()
                .unwrap()
                .push(format!("complete {} {}", scene.name, scene.id))
        })
        .apply()
        .await
        .unwrap();

    assert_eq!(harness.probe.expect_call().await, load_call("Level1"));
    settle(&harness.client).await;
    assert!(entries(&log).is_empty());

    harness
        .events
        .loaded(SceneId(42), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert_eq!(entries(&log), vec!["complete Level1 scene_42"]);

    // A second event for the same name is adopted, not reported again.
    harness
        .events
        .loaded(SceneId(43), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert_eq!(entries(&log).len(), 1);

    harness.shutdown().await;
}

/// A name that does not exist fails right away and never reaches the loader.
#[tokio::test]
async fn test_missing_scene_fails_without_loader_call() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let (on_done, on_fail) = (log.clone(), log.clone());
    harness
        .client
        .load("Missing", LoadMode::Additive)
        .with("Hud")
        .on_complete(move |_| on_done.lock().unwrap().push("complete".into()))
        .on_fail(move |e| on_fail.lock().unwrap().push(e.to_string()))
        .apply()
        .await
        .unwrap();

    assert_no_call(&mut harness).await;
    assert_eq!(entries(&log), vec!["Invalid target: Missing"]);
    assert!(harness.probe.history().is_empty());
    assert!(harness.client.pending().await.unwrap().loads.is_empty());

    let err = harness
        .client
        .load("Missing", LoadMode::Exclusive)
        .apply_and_wait()
        .await
        .unwrap_err();
    assert_eq!(err, SceneError::InvalidTarget("Missing".into()));

    harness.shutdown().await;
}

/// Sequential children: each child is forwarded only after the previous one
/// has completed, and the parent completes last with its own handle.
#[tokio::test]
async fn test_sequential_children_load_in_index_order() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let record = |label: &'static str| {
        let log = log.clone();
        move |scene: scene_orchestrator::ResourceHandle| {
            log.lock()
                .unwrap()
                .push(format!("{} {}", label, scene.id))
        }
    };

    harness
        .client
        .load("Level1", LoadMode::Additive)
        .with_request("Hud", |r| r.on_complete(record("hud")))
        .with_request("Audio", |r| r.on_complete(record("audio")))
        .with_request("Minimap", |r| r.on_complete(record("minimap")))
        .on_complete(record("level"))
        .apply()
        .await
        .unwrap();

    assert_eq!(harness.probe.expect_call().await, load_call("Level1"));
    assert_no_call(&mut harness).await;

    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    assert_eq!(harness.probe.expect_call().await, load_call("Hud"));
    assert_no_call(&mut harness).await;

    harness
        .events
        .loaded(SceneId(2), "Hud", LoadMode::Additive)
        .await
        .unwrap();
    assert_eq!(harness.probe.expect_call().await, load_call("Audio"));
    assert_no_call(&mut harness).await;

    harness
        .events
        .loaded(SceneId(3), "Audio", LoadMode::Additive)
        .await
        .unwrap();
    assert_eq!(harness.probe.expect_call().await, load_call("Minimap"));
    assert_eq!(entries(&log), vec!["hud scene_2", "audio scene_3"]);

    harness
        .events
        .loaded(SceneId(4), "Minimap", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert_eq!(
        entries(&log),
        vec!["hud scene_2", "audio scene_3", "minimap scene_4", "level scene_1"]
    );

    harness.shutdown().await;
}

/// Additive + parallel: the parent and every child are forwarded before any
/// of them finishes; the parent completes only after all of them.
#[tokio::test]
async fn test_parallel_additive_submits_everything_up_front() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let on_done = log.clone();
    harness
        .client
        .load("Level1", LoadMode::Additive)
        .with("Hud")
        .with("Audio")
        .parallel()
        .on_complete(move |scene| on_done.lock().unwrap().push(scene.name))
        .apply()
        .await
        .unwrap();

    assert_eq!(harness.probe.expect_call().await, load_call("Level1"));
    assert_eq!(harness.probe.expect_call().await, load_call("Hud"));
    assert_eq!(harness.probe.expect_call().await, load_call("Audio"));

    // Children finish first, in reverse order.
    harness
        .events
        .loaded(SceneId(3), "Audio", LoadMode::Additive)
        .await
        .unwrap();
    harness
        .events
        .loaded(SceneId(2), "Hud", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert!(entries(&log).is_empty());

    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert_eq!(entries(&log), vec!["Level1"]);

    harness.shutdown().await;
}

/// Parallel additive: the parent's own load may finish first; completion
/// still waits for the children.
#[tokio::test]
async fn test_parallel_parent_waits_for_children() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let on_done = log.clone();
    harness
        .client
        .load("Level1", LoadMode::Additive)
        .with("Hud")
        .parallel()
        .on_complete(move |scene| on_done.lock().unwrap().push(scene.id.to_string()))
        .apply()
        .await
        .unwrap();
    harness.probe.expect_call().await;
    harness.probe.expect_call().await;

    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert!(entries(&log).is_empty());

    harness
        .events
        .loaded(SceneId(2), "Hud", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;
    assert_eq!(entries(&log), vec!["scene_1"]);

    harness.shutdown().await;
}

/// Exclusive mode always loads the parent first, even with `parallel()`;
/// the children then start together.
#[tokio::test]
async fn test_exclusive_parent_loads_before_parallel_children() {
    let mut harness = start_mock_runtime(catalog());

    harness
        .client
        .load("Level1", LoadMode::Exclusive)
        .with("Hud")
        .with("Audio")
        .parallel()
        .apply()
        .await
        .unwrap();

    assert_eq!(
        harness.probe.expect_call().await,
        LoaderCall::Load {
            name: "Level1".into(),
            mode: LoadMode::Exclusive
        }
    );
    assert_no_call(&mut harness).await;

    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Exclusive)
        .await
        .unwrap();
    assert_eq!(harness.probe.expect_call().await, load_call("Hud"));
    assert_eq!(harness.probe.expect_call().await, load_call("Audio"));

    harness.shutdown().await;
}

#[derive(Debug, PartialEq)]
struct LevelConfig {
    difficulty: u8,
}

/// Children without a payload inherit the parent's; a child's own payload wins.
#[tokio::test]
async fn test_data_propagates_to_children_without_payload() {
    let mut harness = start_mock_runtime(catalog());
    let shared = SceneData::new(LevelConfig { difficulty: 2 });

    harness
        .client
        .load("Level1", LoadMode::Additive)
        .payload(shared.clone(), true)
        .with_request("Hud", |r| r.with("Minimap"))
        .with_request("Audio", |r| r.data(String::from("own")))
        .parallel()
        .apply()
        .await
        .unwrap();

    for (raw, name) in [(1, "Level1"), (2, "Hud"), (3, "Audio")] {
        harness.probe.expect_call().await;
        harness
            .events
            .loaded(SceneId(raw), name, LoadMode::Additive)
            .await
            .unwrap();
    }
    assert_eq!(harness.probe.expect_call().await, load_call("Minimap"));
    harness
        .events
        .loaded(SceneId(4), "Minimap", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;

    let client = &harness.client;
    for raw in [1, 2, 4] {
        let scene = client.find(SceneId(raw)).await.unwrap().unwrap();
        assert!(
            SceneData::ptr_eq(scene.payload.as_ref().unwrap(), &shared),
            "{} should share the parent payload",
            scene.name
        );
    }
    let hud_config = client.data::<LevelConfig>(SceneId(2)).await.unwrap().unwrap();
    assert_eq!(*hud_config, LevelConfig { difficulty: 2 });

    let audio = client.data::<String>(SceneId(3)).await.unwrap().unwrap();
    assert_eq!(audio.as_str(), "own");
    assert!(matches!(
        client.data::<LevelConfig>(SceneId(3)).await,
        Err(SceneError::PayloadType { .. })
    ));

    harness.shutdown().await;
}

/// With propagation turned off, children keep no payload.
#[tokio::test]
async fn test_data_without_propagation_stays_on_parent() {
    let mut harness = start_mock_runtime(catalog());

    let pending = tokio::spawn(
        harness
            .client
            .load("Level1", LoadMode::Additive)
            .data_with(LevelConfig { difficulty: 5 }, false)
            .with("Hud")
            .apply_and_wait(),
    );

    harness.probe.expect_call().await;
    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    harness.probe.expect_call().await;
    harness
        .events
        .loaded(SceneId(2), "Hud", LoadMode::Additive)
        .await
        .unwrap();

    let level = pending.await.unwrap().unwrap();
    assert_eq!(level.data::<LevelConfig>().unwrap().unwrap().difficulty, 5);
    let hud = harness.client.find(SceneId(2)).await.unwrap().unwrap();
    assert!(hud.payload.is_none());

    harness.shutdown().await;
}

/// A failed child never completes, so the next sequential sibling is not
/// started and the parent never reports completion.
#[tokio::test]
async fn test_failed_child_stops_sequential_siblings() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let (on_missing, on_done) = (log.clone(), log.clone());
    harness
        .client
        .load("Level1", LoadMode::Additive)
        .with_request("Broken", |r| {
            r.with("Hud")
                .on_fail(move |e| on_missing.lock().unwrap().push(e.to_string()))
        })
        .with("Audio")
        .on_complete(move |scene| on_done.lock().unwrap().push(format!("level {}", scene.id)))
        .apply()
        .await
        .unwrap();

    assert_eq!(harness.probe.expect_call().await, load_call("Level1"));
    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Additive)
        .await
        .unwrap();

    // "Broken" fails synchronously; neither its child nor "Audio" starts.
    assert_no_call(&mut harness).await;
    assert_eq!(entries(&log), vec!["Invalid target: Broken"]);
    assert_eq!(harness.probe.history(), vec![load_call("Level1")]);

    // The parent's own scene is still active.
    assert!(harness.client.find(SceneId(1)).await.unwrap().is_some());

    harness.shutdown().await;
}

/// Parallel siblings of a failed child keep running and complete on their
/// own, but the parent never reports completion.
#[tokio::test]
async fn test_failed_parallel_child_leaves_siblings_running() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let (on_missing, on_hud, on_audio, on_done) =
        (log.clone(), log.clone(), log.clone(), log.clone());
    harness
        .client
        .load("Level1", LoadMode::Additive)
        .with_request("Broken", |r| {
            r.on_fail(move |e| on_missing.lock().unwrap().push(e.to_string()))
        })
        .with_request("Hud", |r| {
            r.on_complete(move |_| on_hud.lock().unwrap().push("hud".into()))
        })
        .with_request("Audio", |r| {
            r.on_complete(move |_| on_audio.lock().unwrap().push("audio".into()))
        })
        .parallel()
        .on_complete(move |_| on_done.lock().unwrap().push("level".into()))
        .apply()
        .await
        .unwrap();

    assert_eq!(harness.probe.expect_call().await, load_call("Level1"));
    assert_eq!(harness.probe.expect_call().await, load_call("Hud"));
    assert_eq!(harness.probe.expect_call().await, load_call("Audio"));

    for (id, name) in [(1, "Level1"), (2, "Hud"), (3, "Audio")] {
        harness
            .events
            .loaded(SceneId(id), name, LoadMode::Additive)
            .await
            .unwrap();
    }
    settle(&harness.client).await;

    assert_eq!(entries(&log), vec!["Invalid target: Broken", "hud", "audio"]);
    assert_eq!(harness.client.scenes().await.unwrap().len(), 3);

    harness.shutdown().await;
}

/// A failed root never starts its children, even when they would run in parallel.
#[tokio::test]
async fn test_failed_parallel_parent_starts_no_children() {
    let mut harness = start_mock_runtime(catalog());

    let err = harness
        .client
        .load("Nowhere", LoadMode::Additive)
        .with("Hud")
        .with("Audio")
        .parallel()
        .apply_and_wait()
        .await
        .unwrap_err();

    assert_eq!(err, SceneError::InvalidTarget("Nowhere".into()));
    assert_no_call(&mut harness).await;

    harness.shutdown().await;
}

/// Only one pending load per name: a second request fails until the first
/// one is reported.
#[tokio::test]
async fn test_second_load_of_pending_name_fails() {
    let mut harness = start_mock_runtime(catalog());

    harness
        .client
        .load("Level1", LoadMode::Additive)
        .apply()
        .await
        .unwrap();
    harness.probe.expect_call().await;

    let err = harness
        .client
        .load("Level1", LoadMode::Additive)
        .apply_and_wait()
        .await
        .unwrap_err();
    assert_eq!(err, SceneError::AlreadyPending("Level1".into()));
    assert_no_call(&mut harness).await;
    assert_eq!(
        harness.client.pending().await.unwrap().loads,
        vec!["Level1".to_string()]
    );

    harness
        .events
        .loaded(SceneId(1), "Level1", LoadMode::Additive)
        .await
        .unwrap();
    settle(&harness.client).await;

    // Once reported, the name can be loaded again as an independent scene.
    harness
        .client
        .load("Level1", LoadMode::Additive)
        .apply()
        .await
        .unwrap();
    assert_eq!(harness.probe.expect_call().await, load_call("Level1"));

    harness.shutdown().await;
}

/// A loader that refuses the call fails the node and clears its pending record.
#[tokio::test]
async fn test_loader_rejection_is_reported_through_on_fail() {
    let mut harness = start_mock_runtime(catalog());
    harness.probe.reject_load("Menu");

    let err = harness
        .client
        .load("Menu", LoadMode::Exclusive)
        .apply_and_wait()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SceneError::LoaderRejected { ref target, .. } if target == "Menu"
    ));
    assert_eq!(harness.probe.history().len(), 1);
    assert!(harness.client.pending().await.unwrap().loads.is_empty());

    harness.shutdown().await;
}

/// Tags are deduplicated, and the handle records where it came from.
#[tokio::test]
async fn test_handle_carries_tags_and_origin() {
    let mut harness = start_mock_runtime(catalog());

    let pending = tokio::spawn(
        harness
            .client
            .load("Level1", LoadMode::Exclusive)
            .tag(["level", "gameplay"])
            .tag(["level"])
            .apply_and_wait(),
    );
    harness.probe.expect_call().await;
    harness
        .events
        .loaded(SceneId(9), "Level1", LoadMode::Exclusive)
        .await
        .unwrap();

    let level = pending.await.unwrap().unwrap();
    assert_eq!(level.tags, vec!["level", "gameplay"]);
    let origin = level.origin.expect("requested scene has an origin");
    assert_eq!(origin.requested_name, "Level1");
    assert_eq!(origin.mode, LoadMode::Exclusive);
    assert!(origin.requested_at <= level.started_at);

    let tagged = harness.client.find_by_tag("gameplay").await.unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, SceneId(9));

    harness.shutdown().await;
}

/// Handlers registered before `apply_and_wait` still run.
#[tokio::test]
async fn test_apply_and_wait_keeps_existing_handlers() {
    let mut harness = start_mock_runtime(catalog());
    let log: Log = Arc::default();

    let on_done = log.clone();
    let pending = tokio::spawn(
        harness
            .client
            .load("Hud", LoadMode::Additive)
            .on_complete(move |scene| on_done.lock().unwrap().push(scene.name))
            .apply_and_wait(),
    );
    harness.probe.expect_call().await;
    harness
        .events
        .loaded(SceneId(5), "Hud", LoadMode::Additive)
        .await
        .unwrap();

    assert_eq!(pending.await.unwrap().unwrap().id, SceneId(5));
    assert_eq!(entries(&log), vec!["Hud"]);

    harness.shutdown().await;
}
