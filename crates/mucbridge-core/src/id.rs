//! Identifier generation for sessions and stanzas.

use uuid::Uuid;

/// New session id.
///
/// Possession of a session id is enough to attach to the session, so this
/// uses random (v4) UUIDs rather than time-ordered ones.
pub fn session_id() -> String {
    Uuid::new_v4().to_string()
}

/// New stanza id for an outgoing message or presence.
pub fn stanza_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn session_ids_are_unique_uuids() {
        let ids: HashSet<String> = (0..1000).map(|_| session_id()).collect();
        assert_eq!(ids.len(), 1000);
        for id in ids.iter().take(5) {
            let parsed = Uuid::parse_str(id).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
        }
    }

    #[test]
    fn stanza_ids_are_unique() {
        let a = stanza_id();
        let b = stanza_id();
        assert_ne!(a, b);
        assert_eq!(Uuid::parse_str(&a).unwrap().get_version_num(), 7);
    }
}
