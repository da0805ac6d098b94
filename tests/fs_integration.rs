//! Black-box tests exercising `memfs` only through its public surface,
//! mirroring the teacher's `tests/integration_tests.rs` placement.

use memfs::{AttributeValue, Configuration, MoveMode, OpenOptions};

#[test]
fn create_write_read_round_trip() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    let channel = fs
        .open("/greeting", OpenOptions::READ | OpenOptions::WRITE | OpenOptions::CREATE)
        .unwrap();
    channel.write(b"hello, world").unwrap();
    channel.seek(0);
    let mut buf = [0u8; 12];
    assert_eq!(channel.read(&mut buf).unwrap(), 12);
    assert_eq!(&buf, b"hello, world");
}

#[test]
fn directories_nest_and_list() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_directory("/a").unwrap();
    fs.create_directory("/a/b").unwrap();
    fs.create_file("/a/b/c.txt").unwrap();
    assert_eq!(fs.list_directory("/a").unwrap(), vec!["b".to_string()]);
    assert_eq!(fs.list_directory("/a/b").unwrap(), vec!["c.txt".to_string()]);
}

/// Scenario S3 at the black-box level: symlink resolution with and without
/// following the final component.
#[test]
fn symlink_resolves_through_intermediate_directories() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_directory("/work").unwrap();
    fs.create_directory("/work/four").unwrap();
    fs.create_symlink("/work/four/five", "/foo").unwrap();
    fs.create_directory("/foo").unwrap();
    fs.create_directory("/foo/bar").unwrap();

    fs.create_file("/work/four/five/bar/hello.txt").unwrap();
    assert!(fs.is_same_file("/work/four/five/bar", "/foo/bar").unwrap());

    assert_eq!(fs.read_symlink("/work/four/five").unwrap(), "/foo");
}

/// Scenario S4 at the black-box level: a self-referential symlink is a loop,
/// not an infinite walk.
#[test]
fn symlink_loop_fails_instead_of_hanging() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_directory("/work").unwrap();
    fs.create_directory("/work/four").unwrap();
    fs.create_symlink("/work/four/loop", "../four/loop").unwrap();

    let err = fs.open("/work/four/loop", OpenOptions::READ).unwrap_err();
    assert_eq!(err.kind(), memfs::FsErrorKind::TooManySymlinks);
}

/// Scenario S5 at the black-box level: deleting an open file doesn't revoke
/// the existing handle, but the name is gone from the tree immediately.
#[test]
fn delete_while_open_preserves_existing_handle() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    let channel = fs
        .open("/scratch", OpenOptions::READ | OpenOptions::WRITE | OpenOptions::CREATE)
        .unwrap();
    channel.write(b"still here").unwrap();
    channel.seek(0);

    fs.delete("/scratch").unwrap();
    assert!(fs.open("/scratch", OpenOptions::READ).is_err());

    let mut buf = [0u8; 10];
    assert_eq!(channel.read(&mut buf).unwrap(), 10);
    assert_eq!(&buf, b"still here");
}

/// Scenario S6 at the black-box level: case-insensitive lookup with the
/// display form preserved in directory listings.
#[test]
fn case_insensitive_lookup_preserves_display_form() {
    let builder = Configuration::unix().path_equality_uses_canonical_form(true).canonical_normalization(
        memfs::NormalizationSet::new([memfs::Normalization::CaseFoldAscii]),
    );
    let fs = memfs::new_filesystem(builder).unwrap();
    fs.create_file("/FOO").unwrap();
    fs.create_file("/bar").unwrap();

    assert!(fs.open("/foo", OpenOptions::READ).is_ok());
    assert_eq!(fs.list_directory("/").unwrap(), vec!["FOO".to_string(), "bar".to_string()]);
}

#[test]
fn move_renames_across_directories() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_directory("/src").unwrap();
    fs.create_directory("/dst").unwrap();
    fs.create_file("/src/file.txt").unwrap();

    fs.r#move("/src/file.txt", "/dst/file.txt", MoveMode::Default).unwrap();

    assert!(fs.open("/src/file.txt", OpenOptions::READ).is_err());
    assert!(fs.open("/dst/file.txt", OpenOptions::READ).is_ok());
}

#[test]
fn move_rejects_directory_into_its_own_subtree() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_directory("/a").unwrap();
    fs.create_directory("/a/b").unwrap();

    let err = fs.r#move("/a", "/a/b/a", MoveMode::Default).unwrap_err();
    assert_eq!(err.kind(), memfs::FsErrorKind::AtomicMoveNotSupported);
}

#[test]
fn attribute_views_are_queryable_across_the_public_api() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_file("/a").unwrap();

    let views = fs.supported_file_attribute_views();
    assert!(views.contains(&"basic"));
    assert!(views.contains(&"unix"));

    fs.set_attribute("/a", "owner:owner", AttributeValue::Text("alice".to_string()), true)
        .unwrap();
    let read_back = fs.read_attributes("/a", "owner:*", true).unwrap();
    assert!(read_back.iter().any(|(name, value)| name == "owner" && *value == AttributeValue::Text("alice".to_string())));
}

#[test]
fn out_of_space_rolls_back_partial_write() {
    let builder = Configuration::unix().block_size(8).max_size(16);
    let fs = memfs::new_filesystem(builder).unwrap();
    let channel = fs
        .open("/big", OpenOptions::READ | OpenOptions::WRITE | OpenOptions::CREATE)
        .unwrap();

    let err = channel.write(&[1u8; 100]).unwrap_err();
    assert_eq!(err.kind(), memfs::FsErrorKind::OutOfSpace);

    channel.seek(0);
    let mut buf = [0u8; 100];
    assert_eq!(channel.read(&mut buf).unwrap(), 0);
}

#[test]
fn concurrent_writers_serialize_through_the_filesystem_lock() {
    use std::thread;

    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    fs.create_file("/counter").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let fs = std::sync::Arc::clone(&fs);
            thread::spawn(move || {
                let path = format!("/from-{i}");
                fs.create_file(&path).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let listing = fs.list_directory("/").unwrap();
    assert_eq!(listing.len(), 9); // counter + 8 created files
}

#[test]
fn registry_forgets_a_dropped_filesystem() {
    let fs = memfs::new_filesystem(Configuration::unix()).unwrap();
    let id = fs.id();
    assert!(memfs::lookup_filesystem(id).is_some());
    drop(fs);
    assert!(memfs::lookup_filesystem(id).is_none());
}
