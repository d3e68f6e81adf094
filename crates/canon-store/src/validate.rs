//! Input validation. Every check here runs before the store is touched.

use canon_types::{CanonError, CanonErrorCode, CanonResult, FactInput};

use crate::config::CanonConfig;

/// Check a new claim against the configured limits.
///
/// `stored` is the number of fact records already held by the store.
pub fn validate_input(config: &CanonConfig, input: &FactInput, stored: usize) -> CanonResult<()> {
    if input.subject.is_empty() {
        return Err(CanonError::new(CanonErrorCode::InvalidSubject, "subject is required"));
    }
    check_length(
        &input.subject,
        config.max_subject_length,
        CanonErrorCode::SubjectTooLong,
        "subject",
    )?;
    if input.predicate.is_empty() {
        return Err(CanonError::new(CanonErrorCode::InvalidPredicate, "predicate is required"));
    }
    check_length(
        &input.predicate,
        config.max_predicate_length,
        CanonErrorCode::PredicateTooLong,
        "predicate",
    )?;
    validate_value(config, &input.value)?;
    if input.tags.len() > config.max_tags {
        return Err(CanonError::new(
            CanonErrorCode::TooManyTags,
            format!("{} tags exceed the limit of {}", input.tags.len(), config.max_tags),
        ));
    }
    ensure_capacity(config, stored)
}

pub fn validate_value(config: &CanonConfig, value: &str) -> CanonResult<()> {
    check_length(value, config.max_value_length, CanonErrorCode::ValueTooLong, "value")
}

/// Fails with `MAX_FACTS_EXCEEDED` when no further record fits.
pub fn ensure_capacity(config: &CanonConfig, stored: usize) -> CanonResult<()> {
    if stored >= config.max_total_facts {
        return Err(CanonError::new(
            CanonErrorCode::MaxFactsExceeded,
            format!("store already holds the maximum of {} facts", config.max_total_facts),
        ));
    }
    Ok(())
}

/// Fails with `MAX_VERSIONS_EXCEEDED` when `version` is past the lineage limit.
pub fn ensure_version(config: &CanonConfig, version: u32) -> CanonResult<()> {
    if version > config.max_versions_per_fact {
        return Err(CanonError::new(
            CanonErrorCode::MaxVersionsExceeded,
            format!(
                "version {version} exceeds the limit of {}",
                config.max_versions_per_fact
            ),
        ));
    }
    Ok(())
}

fn check_length(text: &str, max: usize, code: CanonErrorCode, field: &str) -> CanonResult<()> {
    let len = text.chars().count();
    if len > max {
        return Err(CanonError::new(
            code,
            format!("{field} is {len} characters, limit is {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_types::{FactSource, FactType};

    fn input(subject: &str, predicate: &str, value: &str) -> FactInput {
        FactInput::new(FactType::Character, subject, predicate, value, FactSource::User)
    }

    fn code(result: CanonResult<()>) -> CanonErrorCode {
        result.unwrap_err().code
    }

    #[test]
    fn accepts_valid_input() {
        assert!(validate_input(&CanonConfig::default(), &input("Jean", "age", "35"), 0).is_ok());
    }

    #[test]
    fn empty_fields_rejected() {
        let config = CanonConfig::default();
        assert_eq!(code(validate_input(&config, &input("", "age", "35"), 0)), CanonErrorCode::InvalidSubject);
        assert_eq!(code(validate_input(&config, &input("Jean", "", "35"), 0)), CanonErrorCode::InvalidPredicate);
    }

    #[test]
    fn empty_value_is_allowed() {
        assert!(validate_input(&CanonConfig::default(), &input("Jean", "nickname", ""), 0).is_ok());
    }

    #[test]
    fn length_limits() {
        let config = CanonConfig::default();
        let long_subject = "s".repeat(257);
        let long_predicate = "p".repeat(129);
        let long_value = "v".repeat(10_001);
        assert_eq!(
            code(validate_input(&config, &input(&long_subject, "age", "1"), 0)),
            CanonErrorCode::SubjectTooLong
        );
        assert_eq!(
            code(validate_input(&config, &input("Jean", &long_predicate, "1"), 0)),
            CanonErrorCode::PredicateTooLong
        );
        assert_eq!(
            code(validate_input(&config, &input("Jean", "bio", &long_value), 0)),
            CanonErrorCode::ValueTooLong
        );
        assert!(validate_input(&config, &input(&"s".repeat(256), "age", "1"), 0).is_ok());
    }

    #[test]
    fn lengths_count_characters() {
        let config = CanonConfig {
            max_subject_length: 3,
            ..CanonConfig::default()
        };
        assert!(validate_input(&config, &input("éàü", "age", "1"), 0).is_ok());
    }

    #[test]
    fn tag_limit() {
        let config = CanonConfig {
            max_tags: 1,
            ..CanonConfig::default()
        };
        let tagged = input("Jean", "age", "35").with_tags(["a", "b"]);
        assert_eq!(code(validate_input(&config, &tagged, 0)), CanonErrorCode::TooManyTags);
    }

    #[test]
    fn capacity_and_versions() {
        let config = CanonConfig {
            max_total_facts: 2,
            max_versions_per_fact: 3,
            ..CanonConfig::default()
        };
        assert_eq!(
            code(validate_input(&config, &input("Jean", "age", "35"), 2)),
            CanonErrorCode::MaxFactsExceeded
        );
        assert!(ensure_version(&config, 3).is_ok());
        assert_eq!(code(ensure_version(&config, 4)), CanonErrorCode::MaxVersionsExceeded);
    }

    #[test]
    fn validation_codes_are_flagged() {
        let err = validate_input(&CanonConfig::default(), &input("", "age", "35"), 0).unwrap_err();
        assert!(err.code.is_validation());
    }
}
