//! Safety Limits Integration Tests
//!
//! Request, body and claim limits, and how the pipeline reacts to them.

mod common;

use common::{FixedGenerator, Harness, ScriptedFactSource};
use newsgate::core::{SafetyLimits, SafetyViolation};
use newsgate::domain::GenerationRequest;
use newsgate::PipelineError;

#[test]
fn test_max_prompt_bytes() {
    let limits = SafetyLimits {
        max_prompt_bytes: 100,
        ..Default::default()
    };

    assert!(limits.validate_request(&GenerationRequest::new("x".repeat(50))).is_ok());
    assert!(limits.validate_request(&GenerationRequest::new("x".repeat(100))).is_ok());

    match limits.validate_request(&GenerationRequest::new("x".repeat(200))) {
        Err(SafetyViolation::MaxPromptBytes { actual, limit }) => {
            assert_eq!(actual, 200);
            assert_eq!(limit, 100);
        }
        other => panic!("Expected MaxPromptBytes violation, got {:?}", other),
    }
}

#[test]
fn test_whitespace_prompt_is_empty() {
    let limits = SafetyLimits::default();

    assert_eq!(
        limits.validate_request(&GenerationRequest::new("")),
        Err(SafetyViolation::EmptyPrompt)
    );
    assert_eq!(
        limits.validate_request(&GenerationRequest::new(" \n\t ")),
        Err(SafetyViolation::EmptyPrompt)
    );
}

#[test]
fn test_temperature_bounds() {
    let limits = SafetyLimits::default();

    for ok in [0.0, 0.7, 2.0] {
        let request = GenerationRequest::new("ok").with_temperature(ok);
        assert!(limits.validate_request(&request).is_ok(), "temperature {}", ok);
    }

    for bad in [-0.1, 2.01, f64::NAN] {
        let request = GenerationRequest::new("ok").with_temperature(bad);
        assert!(
            matches!(
                limits.validate_request(&request),
                Err(SafetyViolation::TemperatureOutOfRange { .. })
            ),
            "temperature {}",
            bad
        );
    }
}

#[test]
fn test_token_limit_bounds() {
    let limits = SafetyLimits {
        max_token_limit: 512,
        ..Default::default()
    };

    assert!(limits
        .validate_request(&GenerationRequest::new("ok").with_token_limit(512))
        .is_ok());

    let result = limits.validate_request(&GenerationRequest::new("ok").with_token_limit(513));
    assert_eq!(
        result,
        Err(SafetyViolation::TokenLimitOutOfRange { value: 513, limit: 512 })
    );
}

#[test]
fn test_claim_validation() {
    let limits = SafetyLimits {
        max_body_bytes: 20,
        ..Default::default()
    };

    assert!(limits.validate_claim("Vaccines cause autism").is_err());
    assert!(limits.validate_claim("Rates hold").is_ok());
    assert_eq!(limits.validate_claim("   "), Err(SafetyViolation::EmptyClaim));
}

#[test]
fn test_limits_from_yaml() {
    let limits: SafetyLimits = serde_yaml::from_str(
        r#"
max_prompt_bytes: 2048
stage_timeout_seconds: 10
"#,
    )
    .unwrap();

    assert_eq!(limits.max_prompt_bytes, 2048);
    assert_eq!(limits.stage_timeout_seconds, 10);
    assert_eq!(limits.max_token_limit, 4096);
    assert_eq!(limits.max_body_bytes, 1024 * 1024);
}

#[test]
fn test_violation_messages() {
    assert_eq!(SafetyViolation::EmptyPrompt.to_string(), "Prompt text is required");
    assert_eq!(
        SafetyViolation::MaxBodyBytes { actual: 11, limit: 10 }.to_string(),
        "Maximum body bytes exceeded: 11 > 10"
    );
}

#[tokio::test]
async fn test_oversized_prompt_never_reaches_generator() {
    let harness = Harness::with_settings(
        FixedGenerator::new("Title. Body."),
        ScriptedFactSource::rating("TRUE"),
        |settings| settings.limits.max_prompt_bytes = 10,
    );

    let result = harness
        .orchestrator
        .submit_prompt(&GenerationRequest::new("a prompt well over ten bytes"))
        .await;

    assert!(matches!(
        result,
        Err(PipelineError::Validation(SafetyViolation::MaxPromptBytes { .. }))
    ));
    assert_eq!(harness.store.stats().unwrap().prompts, 0);
    assert_eq!(harness.fact_source.call_count(), 0);
}
