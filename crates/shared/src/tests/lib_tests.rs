use serde_json::json;

use crate::{
    domain::{CheckoutOutcome, CheckoutSummary, ItemId, RetailerProgress, RetailerResult, StepRecord},
    error::ApiError,
    protocol::{
        CheckoutCart, CheckoutExecuteRequest, CheckoutItem, CheckoutProfile, Contact,
        PaymentMethod, ProgressEvent, ShippingAddress, StepAdvanced,
    },
};

fn result(url: &str, success: bool) -> RetailerResult {
    RetailerResult {
        url: url.into(),
        quantity: 1,
        success,
        steps: vec![StepRecord::ok("Open link")],
        error: None,
    }
}

#[test]
fn checkout_request_uses_backend_field_names() {
    let request = CheckoutExecuteRequest {
        cart: CheckoutCart {
            items: vec![CheckoutItem {
                item_id: ItemId::new("p-1"),
                url: "https://a.test/1".into(),
                quantity: 2,
                title: "Kettle".into(),
                name: "Kettle".into(),
                brand: "A".into(),
            }],
        },
        profile: CheckoutProfile {
            shipping_address: ShippingAddress {
                zip: "94107".into(),
                country: "US".into(),
                ..ShippingAddress::default()
            },
            contact: Contact::default(),
            payment: PaymentMethod::card("tok_sandbox_123"),
        },
        headless: true,
    };

    let value = serde_json::to_value(&request).expect("serialize");
    assert_eq!(value["cart"]["items"][0]["itemId"], "p-1");
    assert_eq!(value["cart"]["items"][0]["quantity"], 2);
    assert_eq!(value["profile"]["shippingAddress"]["zip"], "94107");
    assert_eq!(value["profile"]["payment"]["type"], "card");
    assert_eq!(value["profile"]["payment"]["token"], "tok_sandbox_123");
    assert_eq!(value["headless"], true);
}

#[test]
fn summary_counts_successes_and_failures() {
    let summary = CheckoutSummary::from_results(&[
        result("https://a.test/1", true),
        result("https://b.test/2", false),
        result("https://c.test/3", true),
    ]);
    assert_eq!(
        summary,
        CheckoutSummary {
            total: 3,
            success: 2,
            failed: 1
        }
    );
    assert!(summary.is_balanced());
}

#[test]
fn reconciled_outcome_replaces_inconsistent_summary() {
    let outcome = CheckoutOutcome {
        results: vec![result("https://a.test/1", true), result("https://b.test/2", false)],
        summary: CheckoutSummary {
            total: 5,
            success: 5,
            failed: 3,
        },
    }
    .reconciled();

    assert_eq!(outcome.summary.total, 2);
    assert_eq!(outcome.summary.success, 1);
    assert_eq!(outcome.summary.failed, 1);
}

#[test]
fn reconciled_outcome_keeps_consistent_summary() {
    let original = CheckoutOutcome::from_results(vec![result("https://a.test/1", true)]);
    assert_eq!(original.clone().reconciled(), original);
}

#[test]
fn retailer_progress_is_monotonic_and_capped() {
    let mut progress = RetailerProgress::started(0, "A");
    progress.record_step(1);
    assert_eq!(progress.steps_completed, 2);
    progress.record_step(0);
    assert_eq!(progress.steps_completed, 2);
    progress.record_step(17);
    assert_eq!(progress.steps_completed, 3);
    assert!(!progress.finished);
    progress.finish();
    assert!(progress.finished);
}

#[test]
fn progress_event_decodes_named_payloads() {
    let step = ProgressEvent::from_named_payload("step", r#"{"itemIndex":1,"stepIndex":2}"#)
        .expect("decode");
    assert_eq!(
        step,
        Some(ProgressEvent::Step(StepAdvanced {
            item_index: 1,
            step_index: 2
        }))
    );

    let unknown = ProgressEvent::from_named_payload("heartbeat", "{}").expect("decode");
    assert_eq!(unknown, None);

    assert!(ProgressEvent::from_named_payload("step", "{not json").is_err());
}

#[test]
fn progress_event_frame_round_trips_through_payload_decoder() {
    let event = ProgressEvent::Done(CheckoutOutcome::from_results(vec![result(
        "https://a.test/1",
        true,
    )]));
    let frame = event.to_frame().expect("frame");
    assert!(frame.starts_with("event: done\ndata: "));
    assert!(frame.ends_with("\n\n"));
}

#[test]
fn api_error_prefers_detail_message() {
    let body: ApiError = serde_json::from_value(json!({
        "detail": {"message": "session expired", "error": "bad"},
        "message": "outer"
    }))
    .expect("parse");
    assert_eq!(body.describe().as_deref(), Some("session expired"));

    let body: ApiError =
        serde_json::from_value(json!({"detail": "no items", "error": "x"})).expect("parse");
    assert_eq!(body.describe().as_deref(), Some("no items"));

    let body: ApiError = serde_json::from_value(json!({"error": "Request failed"})).expect("parse");
    assert_eq!(body.describe().as_deref(), Some("Request failed"));

    assert_eq!(ApiError::default().describe(), None);
}
