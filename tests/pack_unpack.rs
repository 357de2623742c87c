use starpak::pak::{create_pak, extract_pak, PakArchive};
use starpak::sbon::{Value, ValueMap};
use tempfile::tempdir;

#[test]
fn test_create_pak_from_directory() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("mod");
    std::fs::create_dir_all(source.join("items/food")).unwrap();
    std::fs::write(source.join("mod.config"), b"{}").unwrap();
    std::fs::write(source.join("items/food/soup.item"), b"soup!").unwrap();
    std::fs::write(source.join("items/.DS_Store"), b"junk").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink(source.join("mod.config"), source.join("link.config")).unwrap();

    let mut metadata = ValueMap::new();
    metadata.insert("name".to_string(), Value::from("cool-mod"));

    let pak_path = dir.path().join("cool.pak");
    let report = create_pak(&source, &pak_path, metadata).unwrap();
    assert_eq!(report.files, 2);

    let mut archive = PakArchive::open(&pak_path).unwrap();
    let mut paths = archive.files().list();
    paths.sort_unstable();
    assert_eq!(paths, vec!["/items/food/soup.item", "/mod.config"]);
    assert_eq!(archive.metadata()["name"], Value::from("cool-mod"));
    assert_eq!(archive.get("/items/food/soup.item").unwrap(), b"soup!");
}

#[test]
fn test_pack_then_extract_roundtrip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("in");
    std::fs::create_dir_all(source.join("deep/nested")).unwrap();
    std::fs::write(source.join("top.txt"), b"top").unwrap();
    std::fs::write(source.join("deep/nested/leaf.bin"), [0u8, 1, 255, 254]).unwrap();

    let pak_path = dir.path().join("roundtrip.pak");
    create_pak(&source, &pak_path, ValueMap::new()).unwrap();

    let out = dir.path().join("out");
    let extracted = extract_pak(&pak_path, &out).unwrap();
    assert_eq!(extracted, 2);

    assert_eq!(std::fs::read(out.join("top.txt")).unwrap(), b"top");
    assert_eq!(
        std::fs::read(out.join("deep/nested/leaf.bin")).unwrap(),
        [0u8, 1, 255, 254]
    );
}
