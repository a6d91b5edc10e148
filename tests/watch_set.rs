// tests/watch_set.rs

mod common;
use crate::common::{init_tracing, root, sample_tree, DevloopConfigBuilder, FakeRegistrar, RegistrarCall};

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use devloop::fs::mock::MockFileSystem;
use devloop::fs::RealFileSystem;
use devloop::watch::{compute_watch_set, WatchSetManager};

type TestResult = Result<(), Box<dyn Error>>;

fn excludes() -> Vec<String> {
    ["node_modules", "dist", ".git", "build"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn p(s: &str) -> PathBuf {
    PathBuf::from(s)
}

#[test]
fn walk_skips_excluded_directories_and_their_subtrees() -> TestResult {
    init_tracing();

    let fs = sample_tree();
    fs.add_file("/project/.git/objects/ab/cdef");
    fs.add_file("/project/src/build/gen.go");

    let set = compute_watch_set(&fs, &root(), &excludes(), &[])?;

    assert_eq!(
        set.dirs,
        vec![p("/project"), p("/project/src"), p("/project/src/lib")]
    );
    assert!(set.files.is_empty());
    Ok(())
}

#[test]
fn walk_never_yields_excluded_names() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/project/a/node_modules/x/y/z.js");
    fs.add_file("/project/a/b/dist/c/d.js");
    fs.add_file("/project/a/b/ok/e.go");

    let set = compute_watch_set(&fs, &root(), &excludes(), &[])?;

    for dir in &set.dirs {
        for component in dir.components() {
            let name = component.as_os_str().to_string_lossy();
            assert!(
                !excludes().iter().any(|x| *x == name),
                "{dir:?} contains excluded component {name}"
            );
        }
    }
    assert!(set.contains_dir(&p("/project/a/b/ok")));
    Ok(())
}

#[test]
fn extra_files_are_added_even_outside_the_walk() -> TestResult {
    let fs = sample_tree();
    let extra = vec!["golte.config.ts".to_string(), "dist/manifest.json".to_string()];

    let set = compute_watch_set(&fs, &root(), &excludes(), &extra)?;

    assert_eq!(
        set.files,
        vec![p("/project/golte.config.ts"), p("/project/dist/manifest.json")]
    );
    assert_eq!(set.len(), set.dirs.len() + 2);
    Ok(())
}

#[test]
fn unreadable_subdirectory_is_skipped_not_fatal() -> TestResult {
    init_tracing();

    let fs = sample_tree();
    fs.make_unreadable("/project/src");

    let set = compute_watch_set(&fs, &root(), &excludes(), &[])?;

    // The directory itself is still watched; we just can't descend.
    assert_eq!(set.dirs, vec![p("/project"), p("/project/src")]);
    Ok(())
}

#[test]
fn unreadable_root_is_an_error() {
    let fs = sample_tree();
    fs.make_unreadable("/project");

    assert!(compute_watch_set(&fs, &root(), &excludes(), &[]).is_err());
}

#[test]
fn register_all_continues_past_failures() -> TestResult {
    init_tracing();

    let cfg = DevloopConfigBuilder::new().extra_files(&[]).build();
    let registrar = FakeRegistrar::new();
    registrar.fail_on("/project/src");

    let mut manager =
        WatchSetManager::new(Arc::new(sample_tree()), root(), &cfg.watch, registrar.clone());
    let set = manager.compute()?;
    let report = manager.register_all(&set);

    assert_eq!(report.registered, 2);
    assert_eq!(report.failed, vec![p("/project/src")]);
    assert_eq!(registrar.active(), vec![p("/project"), p("/project/src/lib")]);
    assert_eq!(manager.registered().len(), 2);
    Ok(())
}

#[test]
fn refresh_unregisters_everything_before_registering_again() -> TestResult {
    let cfg = DevloopConfigBuilder::new().extra_files(&[]).build();
    let fs = sample_tree();
    let registrar = FakeRegistrar::new();

    let mut manager =
        WatchSetManager::new(Arc::new(fs.clone()), root(), &cfg.watch, registrar.clone());
    manager.refresh()?;

    fs.add_dir("/project/src/components");
    fs.remove("/project/src/lib");
    registrar.clear();

    manager.refresh()?;

    let calls = registrar.calls();
    let first_watch = calls
        .iter()
        .position(|c| matches!(c, RegistrarCall::Watch(_)))
        .expect("re-registered something");
    assert!(
        calls[..first_watch]
            .iter()
            .all(|c| matches!(c, RegistrarCall::Unwatch(_))),
        "all unwatch calls come first: {calls:?}"
    );
    assert_eq!(first_watch, 3, "three previous directories unregistered");

    assert_eq!(
        manager.current().dirs,
        vec![p("/project"), p("/project/src"), p("/project/src/components")]
    );
    assert_eq!(manager.registered(), manager.current().dirs.as_slice());
    Ok(())
}

#[test]
fn failed_refresh_keeps_previous_subscriptions() -> TestResult {
    let cfg = DevloopConfigBuilder::new().extra_files(&[]).build();
    let fs = sample_tree();
    let registrar = FakeRegistrar::new();

    let mut manager =
        WatchSetManager::new(Arc::new(fs.clone()), root(), &cfg.watch, registrar.clone());
    manager.refresh()?;
    let before = registrar.active();

    fs.make_unreadable("/project");
    assert!(manager.refresh().is_err());
    assert_eq!(registrar.active(), before);
    Ok(())
}

#[test]
fn structural_changes_are_detected_for_new_and_known_dirs() -> TestResult {
    let cfg = DevloopConfigBuilder::new().build();
    let fs = sample_tree();
    let mut manager =
        WatchSetManager::new(Arc::new(fs.clone()), root(), &cfg.watch, FakeRegistrar::new());
    manager.refresh()?;

    fs.add_dir("/project/src/new");
    assert!(manager.affects_structure(&p("/project/src/new")));

    // Gone from disk, but it was being watched.
    fs.remove("/project/src/lib");
    assert!(manager.affects_structure(&p("/project/src/lib")));

    assert!(!manager.affects_structure(&p("/project/src/app.css")));
    Ok(())
}

#[test]
fn real_filesystem_walk_matches_layout() -> TestResult {
    let dir = tempfile::tempdir()?;
    let base = dir.path();
    std::fs::create_dir_all(base.join("src/routes"))?;
    std::fs::create_dir_all(base.join("node_modules/svelte"))?;
    std::fs::create_dir_all(base.join("dist"))?;
    std::fs::write(base.join("main.go"), "package main")?;

    let set = compute_watch_set(&RealFileSystem, base, &excludes(), &[])?;

    assert_eq!(
        set.dirs,
        vec![base.to_path_buf(), base.join("src"), base.join("src/routes")]
    );
    Ok(())
}
