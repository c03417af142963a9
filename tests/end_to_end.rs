// tests/end_to_end.rs
//
// Real filesystem, real `notify` backend. Platform event granularity varies,
// so assertions only rely on events every backend reports, with generous
// waits.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use dirwatch::{DirWatcher, EventKind};
use dirwatch_test_utils::{EVENT_WAIT, EventRecorder, TempTree, init_tracing, wait_until};

fn watcher() -> DirWatcher {
    init_tracing();
    DirWatcher::new().expect("create notify-backed watcher")
}

#[test]
fn creating_a_file_reports_create_and_never_delete() {
    let tree = TempTree::new();
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher
        .register_all(tree.root(), false, None, rec.callback())
        .unwrap();

    tree.file("a", "hello");

    assert!(
        rec.wait_for(EVENT_WAIT, |e| e.kind == EventKind::Create
            && e.relative.ends_with("a")),
        "no create event: {:?}",
        rec.events()
    );
    // Give trailing events a moment to show up.
    thread::sleep(Duration::from_millis(200));

    let events = rec.events();
    assert!(events.iter().all(|e| e.dir == tree.root()));
    assert!(events.iter().all(|e| e.kind != EventKind::Delete), "{events:?}");
}

#[test]
fn new_subdirectory_is_watched_for_modifications() {
    let tree = TempTree::new();
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher
        .register(tree.root(), true, None, rec.callback(), EventKind::Modify)
        .unwrap();

    let sub = tree.dir("sub");
    assert!(
        wait_until(EVENT_WAIT, || watcher.is_watching(&sub).unwrap_or(false)),
        "subdirectory never registered"
    );

    // Write until the modification is seen; the first write may race the
    // new watch being armed on some backends.
    let seen = wait_until(EVENT_WAIT, || {
        fs::write(sub.join("f"), "data").expect("write file");
        rec.wait_for(Duration::from_millis(250), |e| {
            e.dir.ends_with("sub") && e.relative.ends_with("f") && e.kind == EventKind::Modify
        })
    });
    assert!(seen, "no modify event in sub: {:?}", rec.events());
    assert_eq!(rec.count_kind(EventKind::Create), 0);
}

#[test]
fn existing_subdirectories_are_watched_recursively() {
    let tree = TempTree::new();
    tree.dir("a/b");
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher
        .register(tree.root(), true, None, rec.callback(), EventKind::Create)
        .unwrap();

    tree.file("a/b/deep.txt", "x");

    assert!(
        rec.wait_for(EVENT_WAIT, |e| e.dir == tree.path("a/b")
            && e.relative == Path::new("deep.txt")),
        "no create in a/b: {:?}",
        rec.events()
    );
}

#[test]
fn deleting_a_file_reports_delete() {
    let tree = TempTree::new();
    let doomed = tree.file("doomed.txt", "bye");
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher
        .register(tree.root(), false, None, rec.callback(), EventKind::Delete)
        .unwrap();

    fs::remove_file(&doomed).unwrap();

    assert!(
        rec.wait_for(EVENT_WAIT, |e| e.relative == Path::new("doomed.txt")),
        "no delete event: {:?}",
        rec.events()
    );
    assert!(rec.events().iter().all(|e| e.kind == EventKind::Delete));
}

#[test]
fn unregister_one_stops_delivery_to_that_callback_only() {
    let tree = TempTree::new();
    let watcher = watcher();
    let gone = EventRecorder::new();
    let stays = EventRecorder::new();
    watcher
        .register(tree.root(), false, None, gone.callback(), EventKind::Create)
        .unwrap();
    watcher
        .register(tree.root(), false, None, stays.callback(), EventKind::Create)
        .unwrap();

    assert!(watcher.unregister_one(tree.root(), gone.callback()).unwrap());
    tree.file("after.txt", "x");

    assert!(stays.wait_for(EVENT_WAIT, |e| e.relative == Path::new("after.txt")));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(gone.count(), 0);
}

#[cfg(target_os = "linux")]
#[test]
fn removed_directory_is_dropped_from_the_registry() {
    let tree = TempTree::new();
    let sub = tree.dir("sub");
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher.watch(&sub, rec.callback()).unwrap();
    assert_eq!(watcher.watched_directories(), vec![sub.clone()]);

    tree.remove_dir("sub");

    assert!(
        wait_until(EVENT_WAIT, || watcher.watched_directories().is_empty()),
        "still watching: {:?}",
        watcher.watched_directories()
    );
}

#[cfg(target_os = "linux")]
#[test]
fn removing_a_watched_subdirectory_reports_one_delete_to_the_parent() {
    let tree = TempTree::new();
    let sub = tree.dir("sub");
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher
        .register(tree.root(), true, None, rec.callback(), EventKind::Delete)
        .unwrap();
    assert!(watcher.is_watching(&sub).unwrap());

    tree.remove_dir("sub");

    assert!(
        wait_until(EVENT_WAIT, || !watcher.watched_directories().contains(&sub)),
        "still watching: {:?}",
        watcher.watched_directories()
    );
    assert!(rec.wait_for(EVENT_WAIT, |e| e.relative == Path::new("sub")));
    thread::sleep(Duration::from_millis(200));
    let deletes: Vec<_> = rec
        .events()
        .into_iter()
        .filter(|e| e.dir == tree.root() && e.relative == Path::new("sub"))
        .collect();
    assert_eq!(deletes.len(), 1, "{deletes:?}");
}

#[test]
fn stop_shuts_the_loop_down() {
    let tree = TempTree::new();
    let watcher = watcher();
    let rec = EventRecorder::new();
    watcher.watch(tree.root(), rec.callback()).unwrap();

    watcher.stop();
    assert!(wait_until(EVENT_WAIT, || {
        watcher.state() == dirwatch::WatchState::Stopped
    }));

    tree.file("late.txt", "x");
    thread::sleep(Duration::from_millis(200));
    assert!(!rec.any(|e| e.relative == Path::new("late.txt")));
}
