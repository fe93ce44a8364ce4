//! Recovery properties over arbitrary snapshot/journal pairs.

use std::fs;

use proptest::prelude::*;
use tempfile::tempdir;

use super::journal::Record;
use super::snapshot;
use super::state::DurableState;
use super::store::{StatePaths, StateStore};

fn arb_url() -> impl Strategy<Value = String> {
    "https://[a-z]{1,8}\\.example/[a-z0-9/]{0,12}"
}

fn arb_record() -> impl Strategy<Value = Record> {
    prop_oneof![
        4 => any::<u64>().prop_map(Record::MarkSeen),
        1 => arb_url().prop_map(Record::AddSource),
        1 => any::<i64>().prop_map(Record::AddRecipient),
    ]
}

fn arb_state() -> impl Strategy<Value = DurableState> {
    (
        prop::collection::vec(any::<u64>(), 0..20),
        prop::collection::vec(arb_url(), 0..5),
        prop::collection::vec(any::<i64>(), 0..5),
    )
        .prop_map(|(seen, sources, recipients)| DurableState::new(seen, sources, recipients))
}

fn journal_text(records: &[Record]) -> String {
    records.iter().map(|r| format!("{}\n", r)).collect()
}

proptest! {
    #[test]
    fn replay_equals_in_memory_application(
        base in arb_state(),
        records in prop::collection::vec(arb_record(), 0..40),
    ) {
        let dir = tempdir().unwrap();
        let paths = StatePaths::new(dir.path());
        snapshot::save_atomic(&paths.snapshot, &base).unwrap();
        fs::write(&paths.journal, journal_text(&records)).unwrap();

        let mut expected = base.clone();
        expected.apply_all(&records);

        let recovered = StateStore::recover(dir.path()).unwrap();
        prop_assert_eq!(&recovered, &expected);

        // Compaction keeps the same state and leaves nothing to replay
        let store = StateStore::open(dir.path()).unwrap();
        prop_assert_eq!(store.state().unwrap(), expected.clone());
        prop_assert_eq!(StateStore::recover(dir.path()).unwrap(), expected);
    }

    #[test]
    fn torn_final_line_is_ignored(
        records in prop::collection::vec(arb_record(), 0..20),
        torn in arb_record(),
        cut in 0usize..64,
    ) {
        let dir = tempdir().unwrap();
        let paths = StatePaths::new(dir.path());

        let clean = journal_text(&records);
        fs::write(&paths.journal, &clean).unwrap();
        let without_tail = StateStore::recover(dir.path()).unwrap();

        let torn_line = torn.to_string();
        let cut = cut.min(torn_line.len());
        fs::write(&paths.journal, format!("{}{}", clean, &torn_line[..cut])).unwrap();
        let with_tail = StateStore::recover(dir.path()).unwrap();

        prop_assert_eq!(with_tail, without_tail);
    }

    #[test]
    fn seen_set_never_shrinks(records in prop::collection::vec(arb_record(), 0..60)) {
        let mut state = DurableState::default();
        let mut previous = 0;
        for record in &records {
            state.apply(record);
            prop_assert!(state.seen().len() >= previous);
            previous = state.seen().len();
        }
    }
}
