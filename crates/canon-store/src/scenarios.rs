//! End-to-end behaviour of the store across modules.

use canon_types::{
    CanonErrorCode, ContentHash, FactInput, FactSource, FactStatus, FactType, ManualClock,
    ResolutionChoice,
};

use crate::{CanonStore, FactFilter};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn store() -> CanonStore {
    init_tracing();
    CanonStore::with_clock(ManualClock::default())
}

fn character(subject: &str, predicate: &str, value: &str, source: FactSource) -> FactInput {
    FactInput::new(FactType::Character, subject, predicate, value, source)
}

#[test]
fn user_claim_overrides_inferred_one() {
    let mut s = store();
    s.add(character("Jean", "age", "30", FactSource::Inferred)).unwrap();
    s.add(character("Jean", "age", "35", FactSource::User)).unwrap();

    let fact = s.get_fact("Jean", "age").unwrap();
    assert_eq!(fact.value, "35");
    assert_eq!(fact.version, 2);

    let archived = s.query(
        &FactFilter::new()
            .subject("Jean")
            .predicate("age")
            .status(FactStatus::Archived),
    );
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].value, "30");
}

fn eye_color_conflict() -> (CanonStore, String) {
    let mut s = store();
    s.add(character("Jean", "eyeColor", "blue", FactSource::Text)).unwrap();
    let err = s
        .add(character("Jean", "eyeColor", "green", FactSource::Text))
        .unwrap_err();
    assert_eq!(err.code, CanonErrorCode::ConflictUnresolved);
    assert_eq!(s.pending_conflicts().len(), 1);
    let id = err.conflict_id().unwrap().to_string();
    (s, id)
}

#[test]
fn equal_priority_disagreement_opens_a_conflict() {
    let (s, id) = eye_color_conflict();
    assert_eq!(s.pending_conflicts()[0].id, id);
    assert_eq!(s.get_fact("Jean", "eyeColor").unwrap().value, "blue");
}

#[test]
fn resolving_with_existing_keeps_the_value() {
    let (mut s, id) = eye_color_conflict();
    let fact = s.resolve_conflict(&id, ResolutionChoice::Existing, "editor").unwrap();
    assert_eq!(fact.value, "blue");
    assert_eq!(s.get_fact("Jean", "eyeColor").unwrap().value, "blue");
    assert!(s.pending_conflicts().is_empty());
}

#[test]
fn resolving_with_incoming_takes_the_new_value() {
    let (mut s, id) = eye_color_conflict();
    let fact = s.resolve_conflict(&id, ResolutionChoice::Incoming, "editor").unwrap();
    assert_eq!(fact.value, "green");
    assert_eq!(fact.version, 2);
    assert_eq!(s.get_fact("Jean", "eyeColor").unwrap().value, "green");

    let err = s
        .resolve_conflict(&id, ResolutionChoice::Existing, "editor")
        .unwrap_err();
    assert_eq!(err.code, CanonErrorCode::ConflictAlreadyResolved);
}

#[test]
fn stale_conflict_cannot_displace_a_user_fact() {
    let (mut s, id) = eye_color_conflict();
    s.add(character("Jean", "eyeColor", "brown", FactSource::User)).unwrap();
    assert!(s.pending_conflicts().is_empty());

    let err = s
        .resolve_conflict(&id, ResolutionChoice::Incoming, "editor")
        .unwrap_err();
    assert_eq!(err.code, CanonErrorCode::ConflictAlreadyResolved);
    let active = s.get_fact("Jean", "eyeColor").unwrap();
    assert_eq!((active.value.as_str(), active.source), ("brown", FactSource::User));
}

#[test]
fn lower_priority_claim_is_a_silent_no_op() {
    let mut s = store();
    let winner = s.add(character("Jean", "age", "35", FactSource::User)).unwrap();
    let result = s.add(character("Jean", "age", "40", FactSource::Inferred)).unwrap();
    assert_eq!(result, winner);
    assert_eq!(s.count(None), 1);
    assert_eq!(s.audit_trail(None).len(), 1);
}

#[test]
fn deleted_fact_is_hidden_but_queryable() {
    let mut s = store();
    s.add(character("Jean", "temp", "x", FactSource::Text)).unwrap();
    s.delete("Jean", "temp", None, None).unwrap();

    assert!(s.get_fact("Jean", "temp").is_none());
    let deleted = s.query(&FactFilter::new().status(FactStatus::Deleted));
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].value, "x");
}

fn scripted(s: &mut CanonStore) {
    s.add(character("Jean", "age", "30", FactSource::Inferred)).unwrap();
    s.add(character("Jean", "age", "35", FactSource::User)).unwrap();
    s.add(FactInput::new(FactType::Location, "Paris", "country", "France", FactSource::Text))
        .unwrap();
    s.add(character("Jean", "eyeColor", "blue", FactSource::Text)).unwrap();
    let conflict = s
        .add(character("Jean", "eyeColor", "green", FactSource::Text))
        .unwrap_err();
    s.resolve_conflict(
        conflict.conflict_id().unwrap(),
        ResolutionChoice::Incoming,
        "editor",
    )
    .unwrap();
    s.delete("Paris", "country", Some("editor"), Some("retcon")).unwrap();
}

#[test]
fn same_script_same_clock_same_hashes() {
    let mut a = store();
    let mut b = store();
    scripted(&mut a);
    scripted(&mut b);

    assert_eq!(a.current_root_hash(), b.current_root_hash());
    assert_eq!(a.last_hash(), b.last_hash());
    assert_eq!(a.audit_log().head(), b.audit_log().head());
    assert_eq!(a.export().unwrap(), b.export().unwrap());
}

#[test]
fn facts_form_a_single_chain() {
    let mut s = store();
    scripted(&mut s);

    let facts = s.all_facts();
    assert_eq!(facts[0].previous_hash, ContentHash::genesis());
    for pair in facts.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
    }
    assert_eq!(s.last_hash(), &facts[facts.len() - 1].hash);
    assert!(s.verify_integrity().valid);
}

#[test]
fn export_import_preserves_every_active_fact() {
    let mut s = store();
    scripted(&mut s);
    let blob = s.export().unwrap();
    let restored = CanonStore::import(&blob).unwrap();

    assert_eq!(restored.count(None), s.count(None));
    for fact in s.query(&FactFilter::new()) {
        assert_eq!(
            restored.get_fact(&fact.subject, &fact.predicate),
            Some(fact)
        );
    }
}

#[test]
fn any_change_to_the_export_hash_is_detected() {
    let mut s = store();
    scripted(&mut s);
    let blob = s.export().unwrap();
    let hex = blob.export_hash.as_str().to_string();

    for position in [0, 31, hex.len() - 1] {
        let mut forged = hex.clone().into_bytes();
        forged[position] = if forged[position] == b'0' { b'1' } else { b'0' };
        let mut tampered = blob.clone();
        tampered.export_hash = ContentHash::from_hex_unchecked(String::from_utf8(forged).unwrap());
        assert_eq!(
            CanonStore::import(&tampered).unwrap_err().code,
            CanonErrorCode::HashMismatch
        );
    }
}

#[test]
fn snapshot_diff_and_proof_follow_later_changes() {
    let mut s = store();
    s.add(character("Jean", "age", "30", FactSource::Inferred)).unwrap();
    let snapshot = s.create_snapshot();
    s.add(character("Jean", "age", "35", FactSource::User)).unwrap();
    s.add(character("Jean", "hair", "red", FactSource::Text)).unwrap();

    let diff = s.diff(&snapshot).unwrap();
    assert_eq!(diff.added.len(), 1);
    assert_eq!(diff.changed.len(), 1);
    assert!(diff.removed.is_empty());

    let first = s.all_facts()[0].id.clone();
    assert!(s.prove_fact(&first, &snapshot).unwrap().verify());
}
