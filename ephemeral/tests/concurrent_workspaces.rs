//! Independent passes over the same directory must not interfere.

use std::fs;
use std::sync::Barrier;

use metalint_ephemeral::{EphemeralWorkspace, WORKSPACE_PREFIX, list_siblings};

#[test]
fn concurrent_builds_get_distinct_roots() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.go"), "package p // disk\n").unwrap();
    fs::write(src.path().join("b.go"), "package p\n").unwrap();
    let siblings = list_siblings(src.path(), "go").unwrap();

    let barrier = Barrier::new(2);
    let barrier = &barrier;
    let siblings = &siblings;
    let dir = src.path();
    let (first, second) = std::thread::scope(|s| {
        let build = move |live: &'static [u8]| {
            s.spawn(move || {
                barrier.wait();
                EphemeralWorkspace::build(dir, siblings, "a.go", live).unwrap()
            })
        };
        let one = build(b"package p // one\n");
        let two = build(b"package p // two\n");
        (one.join().unwrap(), two.join().unwrap())
    });

    assert_ne!(first.root(), second.root());

    let second_live = second.live_file();
    first.release().unwrap();

    assert_eq!(fs::read(&second_live).unwrap(), b"package p // two\n");
    assert_eq!(
        fs::read_to_string(second.root().join("b.go")).unwrap(),
        "package p\n"
    );
    assert_eq!(
        fs::read_to_string(src.path().join("a.go")).unwrap(),
        "package p // disk\n"
    );

    second.release().unwrap();
    let leftovers = fs::read_dir(src.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn workspaces_are_never_reused() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.go"), "package p\n").unwrap();

    let first = EphemeralWorkspace::build(src.path(), ["a.go"], "a.go", b"1").unwrap();
    let first_root = first.root().to_path_buf();
    first.release().unwrap();

    let second = EphemeralWorkspace::build(src.path(), ["a.go"], "a.go", b"2").unwrap();
    assert_ne!(second.root(), first_root);
    assert_eq!(fs::read(second.live_file()).unwrap(), b"2");
}

#[test]
fn siblings_listing_ignores_live_workspaces() {
    let src = tempfile::tempdir().unwrap();
    fs::write(src.path().join("a.go"), "package p\n").unwrap();
    fs::write(src.path().join("b.go"), "package p\n").unwrap();

    let ws = EphemeralWorkspace::build(src.path(), ["a.go", "b.go"], "a.go", b"x").unwrap();
    assert_eq!(list_siblings(src.path(), "go").unwrap(), ["a.go", "b.go"]);
    drop(ws);
}
