//! # Label decoding
//!
//! Reconstructs structured entity values from a predicted per-token label
//! sequence. Single streaming pass over `(token, label)` pairs, so label
//! order must exactly mirror token order:
//!
//! - `B-<name>` starts (or restarts) the value for `<name>` with the token.
//! - `I-<name>` appends `" " + token`, but only if a `B-<name>` was seen
//!   earlier in the sentence; an orphan `I-` contributes nothing.
//! - `O` is a no-op.
//!
//! A second disjoint `B-<name>` span overwrites the first: one value per
//! entity name per sentence.

use std::collections::{HashMap, HashSet};

/// Mapping from entity name to reconstructed surface value.
pub type EntityMap = HashMap<String, String>;

/// Decode a predicted label sequence back into entity values.
///
/// `tokens` and `labels` must be the same length; the orchestrator enforces
/// this before calling (a mismatch is a hard error there, not here).
pub fn decode(tokens: &[String], labels: &[String]) -> EntityMap {
    debug_assert_eq!(tokens.len(), labels.len());

    let mut entities = EntityMap::new();
    let mut begun: HashSet<&str> = HashSet::new();

    for (token, label) in tokens.iter().zip(labels) {
        if let Some(name) = label.strip_prefix("B-") {
            entities.insert(name.to_string(), token.clone());
            begun.insert(name);
        } else if let Some(name) = label.strip_prefix("I-") {
            if begun.contains(name) {
                if let Some(value) = entities.get_mut(name) {
                    value.push(' ');
                    value.push_str(token);
                }
            }
        }
    }

    entities
}
