// tests/recursive.rs

mod common;
use crate::common::{MockRig, TestResult, WAIT, user_events};

use std::path::{Path, PathBuf};

use dirwatch::{EventKind, KindSet};
use dirwatch_test_utils::{EventRecorder, MockTreeBuilder, wait_until};

fn tree() -> dirwatch::fs::mock::MockFileSystem {
    MockTreeBuilder::new()
        .dir("/w/root/a/b")
        .dir("/w/root/c")
        .file("/w/root/top.txt")
        .file("/w/root/a/inner.txt")
        .build()
}

fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}

#[test]
fn recursive_registration_covers_existing_subdirectories() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();

    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    assert_eq!(
        rig.watcher.watched_directories(),
        paths(&["/w/root", "/w/root/a", "/w/root/a/b", "/w/root/c"])
    );
    assert!(!rig.service.is_watched("/w/root/top.txt"));

    rig.fire("/w/root/a/b", "deep.txt", EventKind::Modify);
    assert!(rec.wait_for_count(1, WAIT));
    assert_eq!(rec.events()[0].dir, Path::new("/w/root/a/b"));
    Ok(())
}

#[test]
fn non_recursive_registration_stays_on_one_directory() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();

    rig.watcher.register_all("/w/root", false, None, rec.callback())?;

    assert_eq!(rig.watcher.watched_directories(), paths(&["/w/root"]));
    Ok(())
}

#[test]
fn unreadable_subdirectory_does_not_abort_siblings() -> TestResult {
    let fs = MockTreeBuilder::new()
        .dir("/w/root/locked/hidden")
        .dir("/w/root/open/nested")
        .unreadable("/w/root/locked")
        .build();
    let rig = MockRig::new(fs);
    let rec = EventRecorder::new();

    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    let watched = rig.watcher.watched_directories();
    assert!(watched.contains(&PathBuf::from("/w/root/locked")));
    assert!(!watched.contains(&PathBuf::from("/w/root/locked/hidden")));
    assert!(watched.contains(&PathBuf::from("/w/root/open/nested")));
    Ok(())
}

#[test]
fn refused_subdirectory_does_not_fail_the_registration() -> TestResult {
    let rig = MockRig::new(tree());
    rig.service.refuse("/w/root/a");
    let rec = EventRecorder::new();

    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    assert_eq!(
        rig.watcher.watched_directories(),
        paths(&["/w/root", "/w/root/c"])
    );
    Ok(())
}

#[test]
fn symlink_cycle_is_registered_once() -> TestResult {
    let fs = MockTreeBuilder::new()
        .dir("/w/root/a")
        .symlink("/w/root/a/back", "/w/root")
        .symlink("/w/root/also_a", "/w/root/a")
        .build();
    let rig = MockRig::new(fs);
    let rec = EventRecorder::new();

    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    assert_eq!(
        rig.watcher.watched_directories(),
        paths(&["/w/root", "/w/root/a"])
    );
    let registered: Vec<PathBuf> = rig
        .service
        .registrations()
        .into_iter()
        .map(|(dir, _)| dir)
        .collect();
    assert_eq!(registered.len(), 2, "registrations: {registered:?}");
    Ok(())
}

#[test]
fn new_subdirectory_is_picked_up_even_without_create_in_filter() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher
        .register("/w/root", true, None, rec.callback(), EventKind::Modify)?;

    rig.fs.add_dir("/w/root/fresh");
    rig.fire("/w/root", "fresh", EventKind::Create);
    assert!(wait_until(WAIT, || rig.service.is_watched("/w/root/fresh")));

    rig.fire("/w/root/fresh", "f", EventKind::Modify);
    assert!(rec.wait_for_count(1, WAIT));

    let events = rec.events();
    assert_eq!(events[0].dir, Path::new("/w/root/fresh"));
    assert_eq!(events[0].relative, Path::new("f"));
    assert_eq!(events[0].kind, EventKind::Modify);
    assert_eq!(rec.count_kind(EventKind::Create), 0);
    Ok(())
}

#[test]
fn new_subdirectory_tree_is_registered_with_its_children() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    // Moved in as a whole: children exist before the create is seen.
    rig.fs.add_dir("/w/root/moved/x/y");
    rig.fire("/w/root", "moved", EventKind::Create);

    assert!(wait_until(WAIT, || rig.service.is_watched("/w/root/moved/x/y")));
    Ok(())
}

#[test]
fn created_file_is_not_registered() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register_all("/w/root", true, None, rec.callback())?;
    let before = rig.service.registrations().len();

    rig.fs.add_file("/w/root/new.txt");
    rig.fire("/w/root", "new.txt", EventKind::Create);
    assert!(rec.wait_for(WAIT, |e| e.relative == Path::new("new.txt")));

    assert_eq!(rig.service.registrations().len(), before);
    Ok(())
}

#[test]
fn non_recursive_subscription_does_not_pick_up_subdirectories() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register_all("/w/root", false, None, rec.callback())?;

    rig.fs.add_dir("/w/root/fresh");
    rig.fire("/w/root", "fresh", EventKind::Create);
    assert!(rec.wait_for_count(1, WAIT));

    assert!(!rig.service.is_watched("/w/root/fresh"));
    Ok(())
}

#[test]
fn pickup_uses_each_recursive_subscriptions_own_parameters() -> TestResult {
    let rig = MockRig::new(tree());
    let creates = EventRecorder::new();
    let modifies = EventRecorder::new();
    let flat = EventRecorder::new();
    rig.watcher
        .register("/w/root", true, None, creates.callback(), EventKind::Create)?;
    rig.watcher
        .register("/w/root", true, None, modifies.callback(), EventKind::Modify)?;
    rig.watcher.register_all("/w/root", false, None, flat.callback())?;

    rig.fs.add_dir("/w/root/fresh");
    rig.fire("/w/root", "fresh", EventKind::Create);
    assert!(wait_until(WAIT, || rig.service.is_watched("/w/root/fresh")));

    rig.fire("/w/root/fresh", "f", EventKind::Create);
    rig.fire("/w/root/fresh", "f", EventKind::Modify);
    assert!(modifies.wait_for(WAIT, |e| e.dir == Path::new("/w/root/fresh")));
    assert!(creates.wait_for(WAIT, |e| e.dir == Path::new("/w/root/fresh")));
    rig.barrier("/w/root/fresh");

    let in_fresh = |rec: &EventRecorder| -> Vec<EventKind> {
        user_events(rec)
            .into_iter()
            .filter(|e| e.dir == Path::new("/w/root/fresh"))
            .map(|e| e.kind)
            .collect()
    };
    assert_eq!(in_fresh(&creates), vec![EventKind::Create]);
    assert_eq!(in_fresh(&modifies), vec![EventKind::Modify]);
    assert!(in_fresh(&flat).is_empty());
    Ok(())
}

#[test]
fn failed_pickup_still_dispatches_the_create_event() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    rig.fs.add_dir("/w/root/denied");
    rig.service.refuse("/w/root/denied");
    rig.fire("/w/root", "denied", EventKind::Create);

    assert!(rec.wait_for(WAIT, |e| e.relative == Path::new("denied")
        && e.kind == EventKind::Create));
    assert!(!rig.service.is_watched("/w/root/denied"));
    Ok(())
}

#[test]
fn vanished_subdirectory_is_skipped() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    // Created and removed again before the loop looks at it.
    rig.fire("/w/root", "ghost", EventKind::Create);

    assert!(rec.wait_for(WAIT, |e| e.relative == Path::new("ghost")));
    assert!(!rig.service.is_watched("/w/root/ghost"));
    Ok(())
}

#[test]
fn unregistering_the_parent_leaves_subdirectories_alone() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register_all("/w/root", true, None, rec.callback())?;

    assert!(rig.watcher.unregister_all("/w/root")?);

    assert_eq!(
        rig.watcher.watched_directories(),
        paths(&["/w/root/a", "/w/root/a/b", "/w/root/c"])
    );
    rig.fire("/w/root/c", "still", EventKind::Create);
    assert!(rec.wait_for(WAIT, |e| e.relative == Path::new("still")));
    Ok(())
}

#[test]
fn subdirectories_inherit_the_kind_filter() -> TestResult {
    let rig = MockRig::new(tree());
    let rec = EventRecorder::new();
    rig.watcher.register(
        "/w/root",
        true,
        None,
        rec.callback(),
        KindSet::of(&[EventKind::Delete]),
    )?;

    rig.fire("/w/root/a", "x", EventKind::Modify);
    rig.fire("/w/root/a", "x", EventKind::Delete);

    assert!(rec.wait_for_count(1, WAIT));
    assert_eq!(rec.kinds(), vec![EventKind::Delete]);
    Ok(())
}
