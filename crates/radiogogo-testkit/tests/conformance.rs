//! Backend conformance: every check runs against both backends.

use std::path::Path;

use proptest::prelude::*;
use radiogogo_store::{FlatFileStore, SqliteStore};
use radiogogo_testkit::conformance;
use radiogogo_testkit::generators::set_ops;

fn open_flat(dir: &Path) -> FlatFileStore {
    FlatFileStore::open(dir).unwrap()
}

fn open_sqlite(dir: &Path) -> SqliteStore {
    SqliteStore::open(dir).unwrap()
}

macro_rules! backend_suite {
    ($backend:ident, $open:expr) => {
        mod $backend {
            use super::*;

            #[test]
            fn add_then_remove() {
                conformance::add_then_remove($open);
            }

            #[test]
            fn add_is_idempotent() {
                conformance::add_is_idempotent($open);
            }

            #[test]
            fn remove_absent_is_ok() {
                conformance::remove_absent_is_ok($open);
            }

            #[test]
            fn sets_are_independent() {
                conformance::sets_are_independent($open);
            }

            #[test]
            fn reopen_preserves_state() {
                conformance::reopen_preserves_state($open);
            }

            #[test]
            fn vote_capability() {
                conformance::vote_capability($open);
            }

            #[test]
            fn concurrent_adds() {
                conformance::concurrent_adds($open);
            }

            proptest! {
                #![proptest_config(ProptestConfig::with_cases(24))]

                #[test]
                fn ops_match_model(ops in set_ops(6, 24)) {
                    conformance::ops_match_model($open, &ops);
                }
            }
        }
    };
}

backend_suite!(flat_file, open_flat);
backend_suite!(sqlite, open_sqlite);

#[test]
fn only_sqlite_tracks_votes() {
    use radiogogo_store::StationStore;
    use radiogogo_testkit::TestDir;

    let dir = TestDir::new();
    assert!(dir.open_flat().as_vote_store().is_none());
    assert!(dir.open_sqlite().as_vote_store().is_some());
}
