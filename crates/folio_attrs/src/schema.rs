//! Compatibility and disambiguation rules.
//!
//! Every attribute kind uses the same rule: a producer value is compatible iff
//! it equals the consumer value. A consumer slot that is absent is not checked
//! at all. A consumer slot that is present against an absent producer slot is
//! incompatible, with one exception: the format slot of a format-agnostic
//! channel (the catch-all channel every build unit exposes).

use crate::attribute::{AttributeKey, AttributeSet};

/// Whether a producer channel is tied to one format or serves all of them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ProducerScope {
    /// The producer only serves the format in its attributes.
    FormatBound,
    /// The producer serves every format; an absent format slot matches any request.
    FormatAgnostic,
}

/// Outcome of matching a producer against a consumer request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Compatibility {
    /// The producer is excluded.
    Incompatible,
    /// The producer is acceptable; `exact` counts slots matched by equality.
    Compatible {
        /// Number of slots where the consumer and producer values are equal.
        exact: u8,
    },
}

impl Compatibility {
    /// Returns `true` for [`Compatibility::Compatible`].
    pub fn is_compatible(self) -> bool {
        matches!(self, Compatibility::Compatible { .. })
    }
}

/// Checks a single attribute slot.
///
/// Returns `None` for incompatible, `Some(true)` for an exact match, and
/// `Some(false)` when the check was skipped or waived.
pub fn check_attribute(
    key: AttributeKey,
    consumer: &AttributeSet,
    producer: &AttributeSet,
    scope: ProducerScope,
) -> Option<bool> {
    match key {
        AttributeKey::Format => match (&consumer.format, &producer.format) {
            (None, _) => Some(false),
            (Some(_), None) if scope == ProducerScope::FormatAgnostic => Some(false),
            (Some(_), None) => None,
            (Some(c), Some(p)) => (c == p).then_some(true),
        },
        AttributeKey::Component => match (consumer.component, producer.component) {
            (None, _) => Some(false),
            (Some(_), None) => None,
            (Some(c), Some(p)) => (c == p).then_some(true),
        },
        AttributeKey::SourceSetId => match (&consumer.source_set_id, &producer.source_set_id) {
            (None, _) => Some(false),
            (Some(_), None) => None,
            (Some(c), Some(p)) => (c == p).then_some(true),
        },
        AttributeKey::ModuleId => match (&consumer.module_id, &producer.module_id) {
            (None, _) => Some(false),
            (Some(_), None) => None,
            (Some(c), Some(p)) => (c == p).then_some(true),
        },
    }
}

/// Matches a whole producer tuple against a consumer request.
pub fn compatibility(
    consumer: &AttributeSet,
    producer: &AttributeSet,
    scope: ProducerScope,
) -> Compatibility {
    let mut exact = 0u8;
    for key in AttributeKey::ALL {
        match check_attribute(key, consumer, producer, scope) {
            None => return Compatibility::Incompatible,
            Some(true) => exact += 1,
            Some(false) => {}
        }
    }
    Compatibility::Compatible { exact }
}

/// Picks the closest matches among compatible candidates from one producer.
///
/// Candidates with the highest exact-match count win. Ties are all kept: two
/// producers presenting identical tuples are both delivered, and merging them
/// is the consumer's concern.
pub fn disambiguate<T>(candidates: Vec<(T, Compatibility)>) -> Vec<T> {
    let best = candidates
        .iter()
        .filter_map(|(_, c)| match c {
            Compatibility::Compatible { exact } => Some(*exact),
            Compatibility::Incompatible => None,
        })
        .max();

    let Some(best) = best else {
        return Vec::new();
    };

    candidates
        .into_iter()
        .filter_map(|(item, c)| match c {
            Compatibility::Compatible { exact } if exact == best => Some(item),
            _ => None,
        })
        .collect()
}
