//! Flat-file backend on-disk format.

use proptest::prelude::*;
use radiogogo_store::StationStore;
use radiogogo_testkit::generators::station_refs;
use radiogogo_testkit::{station, TestDir};

#[test]
fn loads_only_well_formed_lines() {
    let dir = TestDir::new();
    dir.write(
        "bookmarks.txt",
        format!(
            "{}\n\nnot-a-uuid\n{}\n{{broken}}\n   \n{}\n",
            station(1),
            station(2),
            station(3)
        ),
    );

    let store = dir.open_flat();
    assert_eq!(store.get_bookmarks().len(), 3);
    assert!(store.get_hidden().is_empty());
}

#[test]
fn write_back_heals_file() {
    let dir = TestDir::new();
    dir.write("hidden.txt", format!("junk\n{}\n", station(5)));

    let store = dir.open_flat();
    store.add_hidden(&station(6)).unwrap();
    assert_eq!(dir.read("hidden.txt"), format!("{}\n{}\n", station(5), station(6)));
}

#[test]
fn missing_directory_is_created() {
    let dir = TestDir::new();
    let nested = dir.join("nested").join("radiogogo");
    let store = radiogogo_store::FlatFileStore::open(&nested).unwrap();
    store.add_bookmark(&station(1)).unwrap();
    assert!(nested.join("bookmarks.txt").is_file());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn count_matches_well_formed_lines(ids in station_refs(20), junk in 0usize..5) {
        let dir = TestDir::new();
        let mut content = String::new();
        for (i, id) in ids.iter().enumerate() {
            content.push_str(&id.to_string());
            content.push('\n');
            if i < junk {
                content.push_str("definitely-not-an-id\n");
            }
        }
        dir.write("bookmarks.txt", content);

        let store = dir.open_flat();
        prop_assert_eq!(store.get_bookmarks().len(), ids.len());
    }
}
