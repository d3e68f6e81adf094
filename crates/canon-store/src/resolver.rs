//! Source-priority resolution between an active fact and a new claim.

use canon_types::{Fact, FactInput};

/// What an incoming claim does to the ACTIVE fact for its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Higher priority: archive the existing fact and create the next version.
    Supersede,
    /// Lower priority: the existing fact keeps winning.
    Keep,
    /// Equal priority, identical value: nothing to do.
    Same,
    /// Equal priority, different value: needs an explicit resolution.
    Conflict,
}

/// Compare a new claim against the fact currently winning its key.
pub fn compare(existing: &Fact, incoming: &FactInput) -> Outcome {
    let (theirs, ours) = (existing.source.priority(), incoming.source.priority());
    if ours > theirs {
        Outcome::Supersede
    } else if ours < theirs {
        Outcome::Keep
    } else if existing.value == incoming.value {
        Outcome::Same
    } else {
        Outcome::Conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_types::{
        Confidence, ContentHash, FactMetadata, FactSource, FactStatus, FactType,
    };
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    fn existing(source: FactSource, value: &str) -> Fact {
        Fact {
            id: "fact_000001_00000000".into(),
            fact_type: FactType::Character,
            subject: "Jean".into(),
            predicate: "eyeColor".into(),
            value: value.into(),
            source,
            confidence: source.default_confidence(),
            status: FactStatus::Active,
            version: 1,
            hash: ContentHash::genesis(),
            previous_hash: ContentHash::genesis(),
            metadata: FactMetadata::default(),
            created_at: DateTime::<Utc>::default(),
        }
    }

    fn incoming(source: FactSource, value: &str) -> FactInput {
        FactInput::new(FactType::Character, "Jean", "eyeColor", value, source)
    }

    #[test]
    fn user_overrides_text() {
        let out = compare(&existing(FactSource::Text, "blue"), &incoming(FactSource::User, "green"));
        assert_eq!(out, Outcome::Supersede);
    }

    #[test]
    fn inferred_loses_to_user() {
        let out = compare(&existing(FactSource::User, "35"), &incoming(FactSource::Inferred, "40"));
        assert_eq!(out, Outcome::Keep);
    }

    #[test]
    fn equal_priority_same_value_is_idempotent() {
        let out = compare(&existing(FactSource::Text, "blue"), &incoming(FactSource::Text, "blue"));
        assert_eq!(out, Outcome::Same);
    }

    #[test]
    fn equal_priority_different_value_conflicts() {
        let out = compare(&existing(FactSource::Text, "blue"), &incoming(FactSource::Text, "green"));
        assert_eq!(out, Outcome::Conflict);
    }

    #[test]
    fn confidence_does_not_affect_priority() {
        let mut fact = existing(FactSource::Text, "blue");
        fact.confidence = Confidence::Low;
        let claim = incoming(FactSource::Text, "green").with_confidence(Confidence::Absolute);
        assert_eq!(compare(&fact, &claim), Outcome::Conflict);
    }

    fn source() -> impl Strategy<Value = FactSource> {
        prop::sample::select(FactSource::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn priority_is_a_strict_total_order(a in source(), b in source(), value in "[a-z]{1,4}") {
            let forward = compare(&existing(a, &value), &incoming(b, "other"));
            let backward = compare(&existing(b, "other"), &incoming(a, &value));
            match forward {
                Outcome::Supersede => prop_assert_eq!(backward, Outcome::Keep),
                Outcome::Keep => prop_assert_eq!(backward, Outcome::Supersede),
                Outcome::Same | Outcome::Conflict => prop_assert_eq!(a, b),
            }
        }
    }
}
