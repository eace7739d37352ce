use outline_core::{
    LoadPolicy, MemorySyncProvider, NodePath, Outline, OutlineError, OutlineMutation,
    OutlineNode, OutlineStore, StoreConfig, StoreError, SyncError, SyncState,
};
use std::sync::Arc;

fn path(indices: &[usize]) -> NodePath {
    NodePath::new(indices.to_vec())
}

fn sample_outline() -> Outline {
    Outline::from_sections([
        OutlineNode::section("Basics").with_children([
            OutlineNode::unit("Greetings")
                .with_children([OutlineNode::activity("Say hello", None)]),
            OutlineNode::unit("Numbers"),
        ]),
        OutlineNode::section("Grammar"),
    ])
}

fn setup() -> OutlineStore {
    OutlineStore::new(sample_outline(), StoreConfig::default()).unwrap()
}

fn section_names(outline: &Outline) -> Vec<String> {
    outline
        .sections()
        .iter()
        .map(|section| section.name.clone())
        .collect()
}

#[test]
fn new_store_starts_clean_and_idle() {
    let store = setup();
    assert_eq!(store.revision(), 0);
    assert!(!store.is_dirty());
    assert_eq!(store.sync_state(), SyncState::Idle);
    assert_eq!(store.current().node_count(), 5);
}

#[test]
fn new_store_normalizes_inbound_orders() {
    let mut outline = sample_outline();
    Arc::make_mut(&mut outline.sections[1]).order = 9;

    let store = OutlineStore::new(outline, StoreConfig::default()).unwrap();

    assert_eq!(store.current().sections()[1].order, 2);
    assert!(store.current().check_orders().is_ok());
}

#[test]
fn strict_policy_rejects_gapped_orders() {
    let mut outline = sample_outline();
    Arc::make_mut(&mut outline.sections[1]).order = 9;
    let config = StoreConfig {
        load_policy: LoadPolicy::Strict,
        ..StoreConfig::default()
    };

    let err = OutlineStore::new(outline, config).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Outline(OutlineError::InvalidOrder {
            expected: 2,
            found: 9,
            ..
        })
    ));
}

#[test]
fn new_store_rejects_duplicate_ids() {
    let outline = sample_outline();
    let twin = outline.sections()[0].as_ref().clone();
    let broken = Outline {
        sections: vec![outline.sections[0].clone(), Arc::new(twin)],
    };

    let err = OutlineStore::new(broken, StoreConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Outline(OutlineError::DuplicateId(_))
    ));
}

#[test]
fn new_store_rejects_nil_ids() {
    let mut section = OutlineNode::section("S");
    section.id = uuid::Uuid::nil();

    let err =
        OutlineStore::new(Outline::from_sections([section]), StoreConfig::default()).unwrap_err();
    assert!(matches!(err, StoreError::Outline(OutlineError::NilId)));
}

#[test]
fn mutations_publish_new_snapshots_and_keep_old_ones() {
    let mut store = setup();
    let before = store.snapshot();

    store
        .insert(&path(&[]), OutlineNode::section("Culture"), None)
        .unwrap();

    assert_eq!(section_names(&before), vec!["Basics", "Grammar"]);
    assert_eq!(
        section_names(store.current()),
        vec!["Basics", "Grammar", "Culture"]
    );
    assert_eq!(store.revision(), 1);
    assert!(store.is_dirty());
    assert!(Arc::ptr_eq(
        &before.sections()[0],
        &store.current().sections()[0]
    ));
}

#[test]
fn failed_mutation_keeps_snapshot_and_revision() {
    let mut store = setup();
    let before = store.snapshot();

    let err = store.move_node(&path(&[0]), &path(&[0, 1]), 0).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Outline(OutlineError::CyclicMove { .. })
    ));
    assert_eq!(store.current(), &before);
    assert_eq!(store.revision(), 0);
}

#[test]
fn store_operations_delegate_to_mutator() {
    let mut store = setup();

    store.rename(&path(&[1]), "Grammar II").unwrap();
    store.move_node(&path(&[0, 1]), &path(&[1]), 0).unwrap();
    store.remove(&path(&[0, 0, 0])).unwrap();

    let current = store.current();
    assert_eq!(current.get(&path(&[1])).unwrap().name, "Grammar II");
    assert_eq!(current.get(&path(&[1, 0])).unwrap().name, "Numbers");
    assert!(current.get(&path(&[0, 0])).unwrap().children().is_empty());
    assert_eq!(store.revision(), 3);
}

#[test]
fn search_is_derived_view() {
    let store = setup();

    let filtered = store.search("hello");

    assert_eq!(filtered.node_count(), 3);
    assert!(filtered.check_orders().is_ok());
    assert_eq!(store.current().node_count(), 5);
    assert_eq!(store.revision(), 0);

    let hits = store.search_hits("hello");
    assert_eq!(hits.len(), 1);
    assert_eq!(store.find_path(hits[0].node_id), Some(path(&[0, 0, 0])));
}

#[test]
fn batch_applies_all_mutations_as_one_revision() {
    let mut store = setup();
    let batch = [
        OutlineMutation::Insert {
            parent: path(&[1]),
            node: OutlineNode::unit("Tenses"),
            at_index: None,
        },
        OutlineMutation::Rename {
            path: path(&[1, 0]),
            name: "Verb tenses".to_string(),
        },
    ];

    store.apply_batch(&batch).unwrap();

    assert_eq!(store.revision(), 1);
    assert_eq!(
        store.get(&path(&[1, 0])).map(|node| node.name.clone()),
        Some("Verb tenses".to_string())
    );
}

#[test]
fn batch_is_atomic_on_failure() {
    let mut store = setup();
    let before = store.snapshot();
    let batch = [
        OutlineMutation::Rename {
            path: path(&[0]),
            name: "Renamed".to_string(),
        },
        OutlineMutation::Remove { path: path(&[7]) },
    ];

    let err = store.apply_batch(&batch).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Outline(OutlineError::NotFound(_))
    ));
    assert_eq!(store.current(), &before);
    assert_eq!(store.revision(), 0);
}

#[test]
fn batch_over_limit_is_rejected() {
    let config = StoreConfig {
        max_batch_len: 1,
        ..StoreConfig::default()
    };
    let mut store = OutlineStore::new(sample_outline(), config).unwrap();
    let batch = vec![OutlineMutation::Remove { path: path(&[0]) }; 2];

    let err = store.apply_batch(&batch).unwrap_err();

    assert!(matches!(err, StoreError::BatchTooLarge { len: 2, max: 1 }));
}

#[test]
fn mutations_rejected_while_fetch_pending() {
    let mut store = setup();
    store.begin_fetch().unwrap();

    let err = store.rename(&path(&[0]), "x").unwrap_err();
    assert!(matches!(
        err,
        StoreError::SyncInProgress(SyncState::Fetching)
    ));
    assert!(matches!(
        store.begin_save().unwrap_err(),
        StoreError::SyncInProgress(_)
    ));

    let remote = Outline::from_sections([OutlineNode::section("Remote")]);
    store.finish_fetch(Ok(remote)).unwrap();

    assert_eq!(store.sync_state(), SyncState::Idle);
    assert_eq!(section_names(store.current()), vec!["Remote"]);
    assert!(!store.is_dirty());
}

#[test]
fn failed_fetch_keeps_last_snapshot() {
    let mut store = setup();
    store.rename(&path(&[0]), "Local edit").unwrap();
    let before = store.snapshot();

    store.begin_fetch().unwrap();
    let err = store
        .finish_fetch(Err(SyncError::Unavailable("offline".to_string())))
        .unwrap_err();

    assert!(matches!(err, StoreError::Sync(SyncError::Unavailable(_))));
    assert_eq!(store.current(), &before);
    assert_eq!(store.sync_state(), SyncState::Idle);
    assert!(store.is_dirty());
}

#[test]
fn invalid_fetched_snapshot_is_rejected() {
    let mut store = setup();
    let before = store.snapshot();
    let invalid = Outline {
        sections: vec![Arc::new(OutlineNode::unit("Loose unit"))],
    };

    store.begin_fetch().unwrap();
    let err = store.finish_fetch(Ok(invalid)).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Outline(OutlineError::InvalidChildLevel { parent: None, .. })
    ));
    assert_eq!(store.current(), &before);
}

#[test]
fn finish_without_begin_is_rejected() {
    let mut store = setup();
    assert!(matches!(
        store.finish_fetch(Ok(Outline::new())).unwrap_err(),
        StoreError::NoPendingSync
    ));

    let ticket = store.begin_save().unwrap();
    store.finish_save(ticket.clone(), Ok(())).unwrap();
    assert!(matches!(
        store.finish_save(ticket, Ok(())).unwrap_err(),
        StoreError::NoPendingSync
    ));
}

#[test]
fn save_marks_ticket_snapshot_committed() {
    let mut store = setup();
    store.rename(&path(&[0]), "Basics I").unwrap();

    let ticket = store.begin_save().unwrap();
    assert_eq!(ticket.revision(), 1);
    assert_eq!(store.sync_state(), SyncState::Saving { revision: 1 });
    assert_eq!(ticket.snapshot(), store.current());

    store.finish_save(ticket, Ok(())).unwrap();

    assert!(!store.is_dirty());
    assert_eq!(store.committed_snapshot(), store.current());
}

#[test]
fn failed_save_leaves_store_dirty() {
    let mut store = setup();
    store.rename(&path(&[0]), "Basics I").unwrap();

    let ticket = store.begin_save().unwrap();
    let err = store
        .finish_save(ticket, Err(SyncError::Rejected("quota".to_string())))
        .unwrap_err();

    assert!(matches!(err, StoreError::Sync(SyncError::Rejected(_))));
    assert!(store.is_dirty());
    assert_eq!(store.sync_state(), SyncState::Idle);
    assert_eq!(section_names(store.committed_snapshot()), vec!["Basics", "Grammar"]);
}

#[test]
fn stale_save_ticket_is_rejected() {
    let mut store = setup();
    let stale = store.begin_save().unwrap();
    store.finish_save(stale.clone(), Ok(())).unwrap();
    store.rename(&path(&[0]), "Basics I").unwrap();
    let _current = store.begin_save().unwrap();

    let err = store.finish_save(stale, Ok(())).unwrap_err();

    assert!(matches!(
        err,
        StoreError::StaleSaveTicket {
            expected: 1,
            found: 0
        }
    ));
    assert_eq!(store.sync_state(), SyncState::Saving { revision: 1 });
}

#[test]
fn discard_restores_committed_snapshot() {
    let mut store = setup();
    store.remove(&path(&[1])).unwrap();
    assert!(store.is_dirty());

    store.discard_changes().unwrap();

    assert_eq!(section_names(store.current()), vec!["Basics", "Grammar"]);
    assert!(!store.is_dirty());
}

#[test]
fn reload_and_commit_round_trip_through_provider() {
    let remote = Outline::from_sections([OutlineNode::section("Remote basics")]);
    let provider = MemorySyncProvider::with_snapshot("memory", remote);
    let mut store = OutlineStore::empty(StoreConfig::default());

    store.reload(&provider).unwrap();
    assert_eq!(section_names(store.current()), vec!["Remote basics"]);

    store
        .insert(&path(&[]), OutlineNode::section("Local"), None)
        .unwrap();
    store.commit(&provider).unwrap();

    assert_eq!(provider.push_count(), 1);
    assert_eq!(&provider.remote_snapshot(), store.current());
    assert!(!store.is_dirty());
}

#[test]
fn provider_failure_surfaces_and_store_recovers() {
    let provider = MemorySyncProvider::new("memory");
    let mut store = setup();
    provider.fail_next(SyncError::Unavailable("offline".to_string()));

    let err = store.commit(&provider).unwrap_err();
    assert!(matches!(err, StoreError::Sync(_)));
    assert_eq!(store.sync_state(), SyncState::Idle);
    assert_eq!(provider.push_count(), 0);

    store.commit(&provider).unwrap();
    assert_eq!(provider.push_count(), 1);
}

#[test]
fn replace_installs_snapshot_wholesale() {
    let mut store = setup();
    store.rename(&path(&[0]), "Local").unwrap();

    store
        .replace(Outline::from_sections([OutlineNode::section("Imported")]))
        .unwrap();

    assert_eq!(section_names(store.current()), vec!["Imported"]);
    assert!(!store.is_dirty());
    assert_eq!(store.revision(), 2);
}
