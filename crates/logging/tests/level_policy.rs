//! Integration tests for the severity gate.
//!
//! Exercises every pairing of configured maximum and record severity through
//! both the free function and a live emitter.

use logging::{
    ALL_SEVERITIES, CallSite, EchoPolicy, Emitter, LoggerConfig, MemoryTransport, Severity,
    should_emit,
};

// ============================================================================
// Policy Table
// ============================================================================

/// Verifies the full 6x6 table against the rank rule.
#[test]
fn gate_matches_rank_rule_for_every_pair() {
    for configured in ALL_SEVERITIES {
        for record in ALL_SEVERITIES {
            let expected = record != Severity::None && record.rank() <= configured.rank();
            assert_eq!(
                should_emit(configured, record),
                expected,
                "configured {configured}, record {record}"
            );
        }
    }
}

/// Verifies a NONE maximum silences every record.
#[test]
fn none_maximum_emits_nothing() {
    assert!(ALL_SEVERITIES.iter().all(|&record| !should_emit(Severity::None, record)));
}

/// Verifies a NONE record is never emitted, even at DEBUG.
#[test]
fn none_record_is_never_emitted() {
    assert!(ALL_SEVERITIES.iter().all(|&configured| !should_emit(configured, Severity::None)));
}

/// Verifies raising the maximum never disables a previously allowed record.
#[test]
fn gate_is_monotonic_in_configured_maximum() {
    for record in ALL_SEVERITIES {
        let allowed: Vec<bool> = ALL_SEVERITIES
            .iter()
            .map(|&configured| should_emit(configured, record))
            .collect();
        assert!(
            allowed.windows(2).all(|pair| pair[0] <= pair[1]),
            "record {record}: {allowed:?}"
        );
    }
}

// ============================================================================
// Emitter Gating
// ============================================================================

/// Verifies the emitter forwards exactly the records the policy allows.
#[test]
fn emitter_forwards_exactly_the_allowed_records() {
    for configured in ALL_SEVERITIES {
        let emitter = Emitter::with_echo(
            LoggerConfig::new(10, "gate.sh", "gate", configured),
            MemoryTransport::new(),
            Vec::new(),
        );
        for record in ALL_SEVERITIES {
            emitter.emit(record, "x", EchoPolicy::Never, &CallSite::unknown());
        }
        let expected = ALL_SEVERITIES
            .iter()
            .filter(|&&record| should_emit(configured, record))
            .count();
        assert_eq!(emitter.transport().len(), expected, "configured {configured}");
    }
}

/// Verifies a DEBUG record at ERROR maximum produces no transport calls.
#[test]
fn debug_below_error_maximum_is_dropped() {
    let emitter = Emitter::with_echo(
        LoggerConfig::new(10, "gate.sh", "gate", Severity::Error),
        MemoryTransport::new(),
        Vec::new(),
    );
    emitter.emit(Severity::Debug, "noise", EchoPolicy::Never, &CallSite::unknown());
    assert!(emitter.transport().is_empty());
}

// ============================================================================
// Parsing
// ============================================================================

/// Verifies configured maxima are case-insensitive and typos are rejected.
#[test]
fn configured_maximum_parsing_is_strict() {
    assert_eq!("WaRnInG".parse::<Severity>(), Ok(Severity::Warning));
    assert_eq!(" none ".parse::<Severity>(), Ok(Severity::None));
    let error = "warn".parse::<Severity>().unwrap_err();
    assert_eq!(error.input(), "warn");
}

/// Verifies record severities fall back to ERROR instead of vanishing.
#[test]
fn record_severity_parsing_is_lossy() {
    assert_eq!(Severity::parse_lossy("critical"), Severity::Critical);
    assert_eq!(Severity::parse_lossy(""), Severity::Error);
    assert_eq!(Severity::parse_lossy("trace"), Severity::Error);
}
