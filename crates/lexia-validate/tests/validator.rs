//! Async behavior of the validator: caching, cancellation and form state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lexia_validate::{presets, FieldRules, Outcome, Validator, Values, Verdict};
use serde_json::{json, Value};

/// A rule whose async check waits `delay` and rejects "taken".
fn availability(delay: Duration, calls: Arc<AtomicUsize>) -> FieldRules {
    presets::required().validate_async(move |value: Value, _: Values| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(delay).await;
            let verdict = (value == json!("taken")).then_some("Alias already in use");
            Ok::<_, std::io::Error>(verdict)
        }
    })
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

#[tokio::test(start_paused = true)]
async fn newer_call_supersedes_older_one() {
    let validator = Validator::new().field(
        "alias",
        presets::required().validate_async(|value: Value, _: Values| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, std::io::Error>(value != json!("taken"))
        }),
    );
    let all = Values::new();
    let (taken, libre) = (json!("taken"), json!("libre"));

    let (first, second) = tokio::join!(
        validator.validate_and_set("alias", &taken, &all),
        validator.validate_and_set("alias", &libre, &all),
    );

    assert_eq!(first, Outcome::Superseded);
    assert_eq!(second, Outcome::Valid);
    assert!(validator.is_valid());
    assert!(!validator.field_state("alias").validating);
}

#[tokio::test(start_paused = true)]
async fn superseded_result_is_not_cached() {
    let calls = counter();
    let validator = Validator::new().field(
        "alias",
        presets::required().validate_async({
            let calls = calls.clone();
            move |value: Value, _: Values| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, std::io::Error>(value != json!("taken"))
                }
            }
        }),
    );
    let all = Values::new();
    let (taken, libre) = (json!("taken"), json!("libre"));

    let (first, _) = tokio::join!(
        validator.validate_field_with("alias", &taken, &all),
        validator.validate_field_with("alias", &libre, &all),
    );
    assert!(first.is_superseded());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let again = validator.validate_field("alias", &json!("taken")).await;
    assert_eq!(again, Outcome::Invalid("Invalid value".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Now both values are cached.
    validator.validate_field("alias", &json!("taken")).await;
    validator.validate_field("alias", &json!("libre")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn async_message_and_cache_hits() {
    let calls = counter();
    let validator = Validator::new().field(
        "alias",
        presets::required().validate_async({
            let calls = calls.clone();
            move |value: Value, _: Values| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    if value == json!("taken") {
                        Ok::<_, std::io::Error>(Some("Alias already in use"))
                    } else {
                        Ok(None)
                    }
                }
            }
        }),
    );

    for _ in 0..3 {
        let outcome = validator.validate_field("alias", &json!("taken")).await;
        assert_eq!(outcome.error(), Some("Alias already in use"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    validator.clear_errors(Some(&["alias"][..]));
    validator.validate_field("alias", &json!("taken")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn sync_failure_skips_async_check() {
    let calls = counter();
    let validator = Validator::new().field("alias", availability(Duration::from_millis(10), calls.clone()));
    let outcome = validator.validate_field("alias", &json!("")).await;
    assert_eq!(outcome.error(), Some("This field is required"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn async_error_maps_to_generic_message_and_is_retried() {
    let calls = counter();
    let validator = Validator::new().field(
        "alias",
        FieldRules::new().validate_async({
            let calls = calls.clone();
            move |_: Value, _: Values| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<bool, _>(std::io::Error::other("backend down")) }
            }
        }),
    );

    let all = Values::new();
    let outcome = validator.validate_and_set("alias", &json!("x"), &all).await;
    assert_eq!(outcome.error(), Some("Validation failed"));
    assert_eq!(validator.errors()["alias"], "Validation failed");

    validator.validate_field("alias", &json!("x")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn fields_validate_concurrently() {
    let calls = counter();
    let validator = Validator::new()
        .field("alias", availability(Duration::from_millis(100), calls.clone()))
        .field("usuario", availability(Duration::from_millis(100), calls.clone()))
        .field("radicado", presets::radicado());

    let mut values = Values::new();
    values.insert("alias".into(), json!("taken"));
    values.insert("usuario".into(), json!("ana"));
    values.insert("radicado".into(), json!("11001310300120230012300"));

    let started = tokio::time::Instant::now();
    let outcomes = validator.validate_fields(&values).await;
    assert!(started.elapsed() < Duration::from_millis(150));

    assert_eq!(outcomes["alias"].error(), Some("Alias already in use"));
    assert_eq!(outcomes["usuario"], Outcome::Valid);
    assert_eq!(outcomes["radicado"], Outcome::Valid);
    assert_eq!(validator.errors().len(), 1);
    assert!(!validator.is_validating());
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_pending_work() {
    let validator = Validator::new().field("alias", availability(Duration::from_secs(60), counter()));
    validator.set_touched("alias", true);
    validator.set_field_error("alias", Some("stale".into()));

    let all = Values::new();
    let taken = json!("taken");
    let (outcome, _) = tokio::join!(
        validator.validate_and_set("alias", &taken, &all),
        async {
            tokio::task::yield_now().await;
            assert!(validator.field_state("alias").validating);
            validator.reset();
        },
    );

    assert_eq!(outcome, Outcome::Superseded);
    assert_eq!(validator.field_state("alias"), Default::default());
    assert!(validator.is_valid());
}

#[tokio::test]
async fn custom_check_reads_other_fields() {
    let validator = Validator::new().field(
        "confirmar",
        presets::required().validate(|value: &Value, all: &Values| {
            if all.get("password") == Some(value) {
                Verdict::Valid
            } else {
                Verdict::from("Passwords do not match")
            }
        }),
    );

    let mut values = Values::new();
    values.insert("password".into(), json!("Secret123"));
    values.insert("confirmar".into(), json!("Secret124"));
    let outcomes = validator.validate_fields(&values).await;
    assert_eq!(outcomes["confirmar"].error(), Some("Passwords do not match"));
}
