mod common;
use common::*;

use chat_client_core::{ChatLog, DeliveryStatus, Error};
use proptest::prelude::*;

#[test]
fn test_oldest_message_is_evicted() {
    let mut log = ChatLog::new(2);
    log.append(test_message("a")).unwrap();
    log.append(test_message("b")).unwrap();
    log.append(test_message("c")).unwrap();

    let ids: Vec<&str> = log.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["b", "c"]);
    assert_eq!(log.len(), 2);
    assert!(log.get("a").is_none());
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let mut log = ChatLog::new(10);
    log.append(test_message("a")).unwrap();

    let result = log.append(test_message("a"));
    assert!(matches!(result, Err(Error::DuplicateMessageId(id)) if id == "a"));
    assert_eq!(log.len(), 1);
}

#[test]
fn test_evicted_ids_can_be_reused() {
    let mut log = ChatLog::new(1);
    log.append(test_message("a")).unwrap();
    log.append(test_message("b")).unwrap();
    log.append(test_message("a")).unwrap();
    assert_eq!(log.messages()[0].id, "a");
}

#[test]
fn test_set_status() {
    let mut log = ChatLog::default();
    assert_eq!(log.capacity(), 100);
    let mut pending = test_message("a");
    pending.status = DeliveryStatus::Pending;
    log.append(pending).unwrap();

    log.set_status("a", DeliveryStatus::Sent).unwrap();
    assert_eq!(log.get("a").unwrap().status, DeliveryStatus::Sent);

    let result = log.set_status("missing", DeliveryStatus::Failed);
    assert!(matches!(result, Err(Error::UnknownMessageId(_))));
    assert_eq!(log.len(), 1);
}

#[test]
fn test_clear() {
    let mut log = ChatLog::new(5);
    for id in ["a", "b", "c"] {
        log.append(test_message(id)).unwrap();
    }
    log.clear();
    assert!(log.is_empty());
    assert_eq!(log.capacity(), 5);
}

proptest! {
    #[test]
    fn log_never_exceeds_cap(cap in 1usize..20, count in 0usize..100) {
        let mut log = ChatLog::new(cap);
        for i in 0..count {
            log.append(test_message(&format!("m{i}"))).unwrap();
            prop_assert!(log.len() <= cap);
        }
        prop_assert_eq!(log.len(), count.min(cap));
        if count > cap {
            // The survivor at the front is the (count - cap + 1)-th appended.
            let expected = format!("m{}", count - cap);
            prop_assert_eq!(&log.messages()[0].id, &expected);
        }
        let ids: Vec<String> = log.iter().map(|m| m.id.clone()).collect();
        let expected: Vec<String> = (count.saturating_sub(cap)..count).map(|i| format!("m{i}")).collect();
        prop_assert_eq!(ids, expected);
    }
}
