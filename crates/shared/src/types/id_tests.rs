use super::id::{AccountId, TransactionId};

#[test]
fn test_typed_ids_are_distinct_types() {
    let account = AccountId::new("acct-cash");
    let tx = TransactionId::new("tx-001");
    assert_eq!(account.as_str(), "acct-cash");
    assert_eq!(tx.as_str(), "tx-001");
}

#[test]
fn test_display_and_from() {
    let id = TransactionId::from("T3");
    assert_eq!(id.to_string(), "T3");
    assert_eq!(TransactionId::from("T3".to_string()), id);
}

#[test]
fn test_empty_detection() {
    assert!(AccountId::new("").is_empty());
    assert!(!AccountId::new("a").is_empty());
}

#[test]
fn test_reversal_id_prefix() {
    let id = TransactionId::new("T3");
    assert_eq!(id.reversal().as_str(), "REV-T3");
}

#[test]
fn test_serde_transparent() {
    let id = AccountId::new("acct-1");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"acct-1\"");
    let back: AccountId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_ordering_is_lexicographic() {
    let mut ids = vec![
        TransactionId::new("T10"),
        TransactionId::new("T1"),
        TransactionId::new("REV-T1"),
    ];
    ids.sort();
    assert_eq!(
        ids.iter().map(TransactionId::as_str).collect::<Vec<_>>(),
        vec!["REV-T1", "T1", "T10"]
    );
}
