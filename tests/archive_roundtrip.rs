use std::cell::RefCell;
use std::fs::File;
use std::sync::Arc;

use starpak::pak::{ContentSource, PakArchive, PakPhase};
use starpak::sbon::{Value, ValueMap};
use tempfile::tempdir;

fn priority_metadata() -> ValueMap {
    let mut metadata = ValueMap::new();
    metadata.insert("priority".to_string(), Value::Int(9_999_999_999));
    metadata
}

#[test]
fn test_save_then_load_fidelity() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("fidelity.pak");

    // Twenty host files with distinct contents.
    let mut sources = Vec::new();
    for i in 0..20 {
        let path = dir.path().join(format!("input_{i}.bin"));
        let body: Vec<u8> = format!("contents of file number {i}").into_bytes();
        std::fs::write(&path, &body).unwrap();
        sources.push((format!("/data/input_{i}.bin"), path, body));
    }

    let mut archive = PakArchive::new(&pak_path);
    archive.set_metadata(priority_metadata());
    for (virtual_path, host_path, _) in &sources {
        archive.files_mut().set(
            virtual_path.clone(),
            ContentSource::Path {
                path: host_path.clone(),
                offset: None,
                length: None,
            },
        );
    }
    let report = archive.save().unwrap();
    assert_eq!(report.files, 20);
    assert!(archive.is_loaded());

    // A separate handle sees the same metadata and bytes.
    let mut reloaded = PakArchive::open(&pak_path).unwrap();
    assert_eq!(reloaded.metadata(), &priority_metadata());
    assert_eq!(reloaded.len(), 20);
    for (virtual_path, _, body) in &sources {
        assert_eq!(&reloaded.get(virtual_path).unwrap(), body);
    }
}

#[test]
fn test_header_and_metatable_invariants() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("invariants.pak");

    let mut archive = PakArchive::new(&pak_path);
    archive
        .files_mut()
        .set("/a.txt", ContentSource::Buffer(b"alpha".to_vec()));
    archive.save().unwrap();

    let bytes = std::fs::read(&pak_path).unwrap();
    assert_eq!(&bytes[..8], b"SBAsset6");
    let metatable_offset = u64::from_be_bytes(bytes[8..16].try_into().unwrap());
    let start = usize::try_from(metatable_offset).unwrap();
    assert_eq!(&bytes[start..start + 5], b"INDEX");
    // The single body sits between the header and the metatable.
    assert_eq!(&bytes[16..21], b"alpha");
    assert_eq!(metatable_offset, 21);
}

#[test]
fn test_binary_payload_fidelity() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("binary.pak");

    // Deliberately invalid UTF-8 with every byte value present.
    let mut body: Vec<u8> = (0u8..=255).collect();
    body.extend_from_slice(&[0xFF, 0xFE, 0x80, 0x00, 0xC3, 0x28]);

    let mut archive = PakArchive::new(&pak_path);
    archive
        .files_mut()
        .set("/sfx/boom.ogg", ContentSource::Buffer(body.clone()));
    archive.save().unwrap();

    let mut reloaded = PakArchive::open(&pak_path).unwrap();
    assert_eq!(reloaded.get("/sfx/boom.ogg").unwrap(), body);
}

#[test]
fn test_modify_and_save() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("modify.pak");

    let mut archive = PakArchive::new(&pak_path);
    archive.set_metadata(priority_metadata());
    archive
        .files_mut()
        .set("/keep.txt", ContentSource::Buffer(b"kept".to_vec()));
    archive
        .files_mut()
        .set("/replace.txt", ContentSource::Buffer(b"old".to_vec()));
    archive.save().unwrap();

    // Mutate the loaded archive: new metadata key, one entry swapped to a
    // host file.
    let replacement = dir.path().join("replacement.txt");
    std::fs::write(&replacement, b"new contents").unwrap();

    archive
        .metadata_mut()
        .insert("test".to_string(), Value::from("success"));
    archive.files_mut().set(
        "/replace.txt",
        ContentSource::Path {
            path: replacement,
            offset: None,
            length: None,
        },
    );
    archive.save().unwrap();

    let mut reloaded = PakArchive::open(&pak_path).unwrap();
    assert_eq!(
        reloaded.metadata()["priority"],
        Value::Int(9_999_999_999)
    );
    assert_eq!(reloaded.metadata()["test"], Value::from("success"));
    assert_eq!(reloaded.get("/keep.txt").unwrap(), b"kept");
    assert_eq!(reloaded.get("/replace.txt").unwrap(), b"new contents");
}

#[test]
fn test_self_referential_resave() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("resave.pak");

    let mut archive = PakArchive::new(&pak_path);
    archive
        .files_mut()
        .set("/one.txt", ContentSource::Buffer(b"first body".to_vec()));
    archive
        .files_mut()
        .set("/two.txt", ContentSource::Buffer(b"second body".to_vec()));
    archive.save().unwrap();

    // After the save-reload every source is an archive window into the
    // very file save is about to replace.
    archive.save().unwrap();

    let mut reloaded = PakArchive::open(&pak_path).unwrap();
    assert_eq!(reloaded.get("/one.txt").unwrap(), b"first body");
    assert_eq!(reloaded.get("/two.txt").unwrap(), b"second body");
}

#[test]
fn test_empty_archive_roundtrip() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("empty.pak");

    let mut archive = PakArchive::new(&pak_path);
    let report = archive.save().unwrap();
    assert_eq!(report.files, 0);
    // Header only, then "INDEX", empty map, zero entries.
    assert_eq!(report.metatable_offset, 16);

    let reloaded = PakArchive::open(&pak_path).unwrap();
    assert!(reloaded.files().is_empty());
    assert!(reloaded.metadata().is_empty());
}

#[test]
fn test_handle_and_windowed_sources() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("windows.pak");

    let host = dir.path().join("big.bin");
    std::fs::write(&host, b"0123456789abcdef").unwrap();
    let handle = Arc::new(File::open(&host).unwrap());

    let mut archive = PakArchive::new(&pak_path);
    archive.files_mut().set(
        "/from_handle.bin",
        ContentSource::Handle {
            file: Arc::clone(&handle),
            offset: Some(10),
            length: Some(6),
        },
    );
    archive.files_mut().set(
        "/from_path_tail.bin",
        ContentSource::Path {
            path: host.clone(),
            offset: Some(12),
            length: None,
        },
    );
    archive.save().unwrap();

    // Caller still owns the handle.
    assert_eq!(handle.metadata().unwrap().len(), 16);

    let mut reloaded = PakArchive::open(&pak_path).unwrap();
    assert_eq!(reloaded.get("/from_handle.bin").unwrap(), b"abcdef");
    assert_eq!(reloaded.get("/from_path_tail.bin").unwrap(), b"cdef");
}

#[test]
fn test_progress_event_order() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("events.pak");

    let mut archive = PakArchive::new(&pak_path);
    archive
        .files_mut()
        .set("/a", ContentSource::Buffer(b"a".to_vec()));
    archive
        .files_mut()
        .set("/b", ContentSource::Buffer(b"bb".to_vec()));

    let events = RefCell::new(Vec::new());
    archive
        .save_with_progress(&|progress| {
            events
                .borrow_mut()
                .push((progress.phase.as_str(), progress.current));
        })
        .unwrap();

    let events = events.into_inner();
    let names: Vec<&str> = events.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec![
            "save.start",
            "save.header",
            "save.files",
            "save.file.progress",
            "save.file.progress",
            "save.metatable",
            "close",
            "load.start",
            "load.header",
            "load.metatable",
            "load.files",
            "load.file.progress",
            "load.file.progress",
            "load.done",
            "save.done",
        ]
    );
    // Per-file indexes count from one.
    let file_events: Vec<usize> = events
        .iter()
        .filter(|(name, _)| *name == "save.file.progress")
        .map(|(_, current)| *current)
        .collect();
    assert_eq!(file_events, vec![1, 2]);
}

#[test]
fn test_save_failure_leaves_original_untouched() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("survivor.pak");

    let mut archive = PakArchive::new(&pak_path);
    archive
        .files_mut()
        .set("/ok.txt", ContentSource::Buffer(b"original".to_vec()));
    archive.save().unwrap();
    let original_bytes = std::fs::read(&pak_path).unwrap();

    archive.files_mut().set(
        "/broken.txt",
        ContentSource::Path {
            path: dir.path().join("does-not-exist.bin"),
            offset: None,
            length: None,
        },
    );
    assert!(archive.save().is_err());

    assert_eq!(std::fs::read(&pak_path).unwrap(), original_bytes);
    // The aborted temp file is the caller's to sweep.
    assert!(pak_path.with_extension("pak.tmp").exists());
}

#[test]
fn test_close_event_and_state() {
    let dir = tempdir().unwrap();
    let pak_path = dir.path().join("close.pak");

    let mut archive = PakArchive::new(&pak_path);
    archive
        .files_mut()
        .set("/x", ContentSource::Buffer(b"x".to_vec()));
    archive.save().unwrap();
    assert!(archive.is_loaded());

    let saw_close = RefCell::new(false);
    archive.close_with_progress(&|progress| {
        if progress.phase == PakPhase::Closed {
            *saw_close.borrow_mut() = true;
        }
    });
    assert!(*saw_close.borrow());
    assert!(!archive.is_loaded());
    assert!(archive.files().is_empty());
    assert!(archive.metadata().is_empty());
}
