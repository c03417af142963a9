// tests/kinds.rs

use dirwatch::logging::parse_level_str;
use dirwatch::{EventKind, KindSet};

#[test]
fn kind_set_membership() {
    let set = KindSet::of(&[EventKind::Create, EventKind::Delete]);

    assert!(set.contains(EventKind::Create));
    assert!(set.contains(EventKind::Delete));
    assert!(!set.contains(EventKind::Modify));
    assert!(!set.contains(EventKind::Overflow));
    assert_eq!(set.len(), 2);
    assert_eq!(
        set.iter().collect::<Vec<_>>(),
        vec![EventKind::Create, EventKind::Delete]
    );
}

#[test]
fn all_and_empty() {
    assert_eq!(KindSet::ALL.len(), 4);
    assert!(EventKind::ALL.iter().all(|k| KindSet::ALL.contains(*k)));
    assert!(KindSet::EMPTY.is_empty());
    assert_eq!(KindSet::from(EventKind::ALL), KindSet::ALL);
    assert_eq!(format!("{:?}", KindSet::from(EventKind::Modify)), "{Modify}");
}

#[test]
fn event_kind_text_form() {
    for kind in EventKind::ALL {
        assert_eq!(kind.to_string().parse::<EventKind>(), Ok(kind));
    }
    assert_eq!(" Create ".parse::<EventKind>(), Ok(EventKind::Create));
    assert!("rename".parse::<EventKind>().is_err());
}

#[test]
fn log_level_names() {
    assert_eq!(parse_level_str("warning"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("DEBUG"), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str("loud"), None);
}
