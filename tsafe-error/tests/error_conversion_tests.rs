//! Tests for error conversion and the code table

use tsafe_error::{
    codes,
    kinds::{KeyNotFound, ReentrantCall, Timeout, TimeoutPhase},
    Error, ErrorCategory, ErrorSource, ToErrorCategory,
};

#[test]
fn test_error_from_timeout_kinds() {
    let lock: Error = Error::from(Timeout::new(TimeoutPhase::Lock));
    assert_eq!(lock.category, ErrorCategory::Timeout);
    assert_eq!(lock.code, codes::LOCK_TIMEOUT);

    let signal: Error = Error::from(Timeout::new(TimeoutPhase::Signal));
    assert_eq!(signal.category, ErrorCategory::Timeout);
    assert_eq!(signal.code, codes::SIGNAL_TIMEOUT);
}

#[test]
fn test_error_from_reentrant_call() {
    let error: Error = ReentrantCall.into();
    assert_eq!(error.to_category(), ErrorCategory::Concurrency);
    assert_eq!(error.code(), codes::REENTRANT_CALL);
}

#[test]
fn test_error_from_key_not_found() {
    let error: Error = KeyNotFound.into();
    assert_eq!(error, Error::KEY_NOT_FOUND);
    assert!(error.is_operation_error());
}

#[test]
fn test_question_mark_conversion() {
    fn lookup(present: bool) -> tsafe_error::Result<u32> {
        if !present {
            Err(KeyNotFound)?;
        }
        Ok(7)
    }

    assert_eq!(lookup(true), Ok(7));
    assert_eq!(lookup(false), Err(Error::KEY_NOT_FOUND));
}

#[test]
fn test_wrap_codes_are_distinct() {
    let wrap_codes = [
        codes::WRAP_ERROR,
        codes::MEMBER_ENUMERATION_FAILED,
        codes::DUPLICATE_MEMBER,
        codes::INCONSISTENT_TRANSFORM,
        codes::UNKNOWN_MEMBER,
        codes::EXCLUDED_MEMBER,
    ];
    for (i, a) in wrap_codes.iter().enumerate() {
        assert!((1000..1100).contains(a));
        for b in &wrap_codes[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_constructor_categories() {
    assert_eq!(
        Error::member_enumeration_failed("x").category,
        ErrorCategory::Wrap
    );
    assert_eq!(Error::inconsistent_transform("x").code, codes::INCONSISTENT_TRANSFORM);
    assert_eq!(Error::excluded_member("x").code, codes::EXCLUDED_MEMBER);
    assert_eq!(Error::concurrency_error("x").code, codes::CONCURRENCY_ERROR);
    assert_eq!(Error::operation_error("x").code, codes::OPERATION_ERROR);
    assert_eq!(Error::lock_timeout().message(), Error::LOCK_TIMEOUT.message);
}

#[test]
fn test_std_error_source() {
    let boxed: Box<dyn std::error::Error> = Box::new(Error::signal_timeout());
    assert!(boxed.to_string().contains("hand-off signal"));
}
