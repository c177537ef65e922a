use std::collections::HashSet;
use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use agilent_sorter::domain::SampleName;
use agilent_sorter::error::SorterError;
use agilent_sorter::store::Store;

#[test]
fn copy_numbers_past_existing_destinations() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let source = root.join("run.d");
    fs::create_dir_all(source.join("nested")).unwrap();
    fs::write(source.join("nested/data.bin"), b"abc").unwrap();

    let destination = root.join("dest");
    fs::create_dir_all(destination.join("Xy/Foo ESI.d")).unwrap();
    fs::create_dir_all(destination.join("Xy/Foo-1 ESI.d")).unwrap();

    let store = Store::new(destination.clone(), "ESI");
    let sample = SampleName::sanitize("Foo");
    assert_eq!(
        store.planned_destination("Xy", &sample, &HashSet::new()),
        destination.join("Xy/Foo-2 ESI.d")
    );

    let outcome = store.copy_run(&source, "Xy", &sample).unwrap();
    assert_eq!(outcome.destination, destination.join("Xy/Foo-2 ESI.d"));
    assert_eq!(outcome.collisions, 2);
    assert_eq!(
        fs::read(outcome.destination.join("nested/data.bin")).unwrap(),
        b"abc"
    );
}

#[test]
fn copy_creates_missing_subfolder() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let source = root.join("run.d");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("DAD1.UV"), b"uv").unwrap();

    let store = Store::new(root.join("dest"), "GCMS");
    let outcome = store
        .copy_run(&source, "Ab", &SampleName::sanitize("Ab 7"))
        .unwrap();
    assert_eq!(outcome.collisions, 0);
    assert!(root.join("dest/Ab/Ab 7 GCMS.d/DAD1.UV").is_file());
}

#[cfg(unix)]
#[test]
fn failed_copy_leaves_no_partial_destination() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let source = root.join("run.d");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("DAD1.UV"), b"uv").unwrap();
    std::os::unix::fs::symlink("missing-target", source.join("broken")).unwrap();

    let store = Store::new(root.join("dest"), "ESI");
    let err = store
        .copy_run(&source, "Xy", &SampleName::sanitize("xy 1"))
        .unwrap_err();

    assert_matches!(err, SorterError::Copy { .. });
    assert!(!root.join("dest/Xy/xy 1 ESI.d").exists());
    assert!(root.join("dest/Xy").is_dir());
}
