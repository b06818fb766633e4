use super::*;
use shared::{
    domain::{ItemId, StepRecord},
    protocol::{
        CheckoutCart, CheckoutProfile, Contact, PaymentMethod, RetailerDone, RetailerStart,
        ShippingAddress, StepAdvanced,
    },
};

fn item(url: &str, quantity: u32, brand: &str) -> CheckoutItem {
    CheckoutItem {
        item_id: ItemId::new(format!("id-{brand}")),
        url: url.into(),
        quantity,
        title: "Thing".into(),
        name: "Thing".into(),
        brand: brand.into(),
    }
}

fn request(items: Vec<CheckoutItem>) -> CheckoutExecuteRequest {
    CheckoutExecuteRequest {
        cart: CheckoutCart { items },
        profile: CheckoutProfile {
            shipping_address: ShippingAddress::default(),
            contact: Contact::default(),
            payment: PaymentMethod::card("tok_sandbox_123"),
        },
        headless: true,
    }
}

fn outcome(url: &str, quantity: u32) -> CheckoutOutcome {
    CheckoutOutcome::from_results(vec![RetailerResult {
        url: url.into(),
        quantity,
        success: true,
        steps: vec![StepRecord::ok("Open link")],
        error: None,
    }])
}

fn session_at_payment(items: Vec<CheckoutItem>) -> CheckoutSession {
    let mut session = CheckoutSession::new();
    assert!(session
        .reduce(SessionAction::ProceedToReview { items })
        .is_applied());
    assert!(session.reduce(SessionAction::ProceedToPayment).is_applied());
    session
}

fn begin(session: &mut CheckoutSession, items: Vec<CheckoutItem>) -> Generation {
    assert!(session
        .reduce(SessionAction::BeginAttempt {
            request: request(items)
        })
        .is_applied());
    session.generation()
}

#[test]
fn review_requires_a_purchasable_line() {
    let mut session = CheckoutSession::new();
    assert_eq!(
        session.reduce(SessionAction::ProceedToReview { items: vec![] }),
        Transition::Ignored(Rejection::EmptyCart)
    );
    assert_eq!(
        session.reduce(SessionAction::ProceedToReview {
            items: vec![item("", 1, "A"), item("https://b.test/1", 0, "B")]
        }),
        Transition::Ignored(Rejection::EmptyCart)
    );
    assert_eq!(session.step(), CheckoutStep::Cart);
}

#[test]
fn review_keeps_only_purchasable_lines() {
    let mut session = CheckoutSession::new();
    session.reduce(SessionAction::ProceedToReview {
        items: vec![item("  ", 1, "A"), item("https://b.test/1", 2, "B")],
    });
    assert_eq!(session.step(), CheckoutStep::Review);
    assert_eq!(session.items().len(), 1);
    assert_eq!(session.items()[0].brand, "B");
}

#[test]
fn payment_is_only_reachable_from_review() {
    let mut session = CheckoutSession::new();
    assert_eq!(
        session.reduce(SessionAction::ProceedToPayment),
        Transition::Ignored(Rejection::WrongStep)
    );
    let mut session = session_at_payment(vec![item("https://a.test/1", 1, "A")]);
    assert_eq!(session.step(), CheckoutStep::Payment);
    assert_eq!(
        session.reduce(SessionAction::ProceedToPayment),
        Transition::Ignored(Rejection::WrongStep)
    );
}

#[test]
fn attempt_requires_payment_step() {
    let mut session = CheckoutSession::new();
    assert_eq!(
        session.reduce(SessionAction::BeginAttempt {
            request: request(vec![item("https://a.test/1", 1, "A")])
        }),
        Transition::Ignored(Rejection::WrongStep)
    );
}

#[test]
fn second_attempt_is_rejected_while_first_is_in_flight() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items.clone());

    assert_eq!(
        session.reduce(SessionAction::BeginAttempt {
            request: request(items)
        }),
        Transition::Ignored(Rejection::AttemptInFlight)
    );
    assert_eq!(session.generation(), generation);
    assert!(session.is_in_flight());
}

#[test]
fn progress_events_build_per_retailer_state() {
    let items = vec![item("https://a.test/1", 1, "A"), item("https://b.test/2", 1, "B")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items);

    let events = [
        ProgressEvent::RetailerStart(RetailerStart {
            index: 0,
            brand: "Acme".into(),
        }),
        ProgressEvent::Step(StepAdvanced {
            item_index: 0,
            step_index: 0,
        }),
        ProgressEvent::Step(StepAdvanced {
            item_index: 0,
            step_index: 1,
        }),
        ProgressEvent::Step(StepAdvanced {
            item_index: 1,
            step_index: 0,
        }),
        ProgressEvent::RetailerDone(RetailerDone { index: 1 }),
    ];
    for event in events {
        assert!(session
            .reduce(SessionAction::Progress { generation, event })
            .is_applied());
    }

    let acme = &session.progress()[&0];
    assert_eq!(acme.brand, "Acme");
    assert_eq!(acme.steps_completed, 2);
    assert!(!acme.finished);

    let second = &session.progress()[&1];
    assert_eq!(second.brand, "B");
    assert_eq!(second.steps_completed, 3);
    assert!(second.finished);
}

#[test]
fn completion_snapshots_items_and_clears_progress() {
    let items = vec![item("https://a.test/1", 2, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items.clone());
    session.reduce(SessionAction::Progress {
        generation,
        event: ProgressEvent::RetailerStart(RetailerStart {
            index: 0,
            brand: "A".into(),
        }),
    });

    assert!(session
        .reduce(SessionAction::Complete {
            generation,
            outcome: outcome("https://a.test/1", 2),
        })
        .is_applied());

    assert_eq!(session.step(), CheckoutStep::Done);
    assert!(!session.is_in_flight());
    assert!(session.progress().is_empty());
    assert_eq!(session.purchased(), items.as_slice());
    assert_eq!(session.results().len(), 1);
    let summary = session.summary().expect("summary");
    assert_eq!((summary.total, summary.success, summary.failed), (1, 1, 0));
}

#[test]
fn events_after_completion_are_ignored() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items);
    session.reduce(SessionAction::Complete {
        generation,
        outcome: outcome("https://a.test/1", 1),
    });
    let done = session.clone();

    assert_eq!(
        session.reduce(SessionAction::Progress {
            generation,
            event: ProgressEvent::RetailerStart(RetailerStart {
                index: 0,
                brand: "A".into()
            }),
        }),
        Transition::Ignored(Rejection::Stale)
    );
    assert_eq!(
        session.reduce(SessionAction::Complete {
            generation,
            outcome: outcome("https://other.test/9", 9),
        }),
        Transition::Ignored(Rejection::Stale)
    );
    assert_eq!(session, done);
}

#[test]
fn back_to_cart_makes_in_flight_updates_stale() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items);

    session.reduce(SessionAction::BackToCart);
    assert_eq!(session.step(), CheckoutStep::Cart);
    assert!(!session.is_in_flight());
    assert!(session.generation() > generation);

    assert_eq!(
        session.reduce(SessionAction::Progress {
            generation,
            event: ProgressEvent::RetailerDone(RetailerDone { index: 0 }),
        }),
        Transition::Ignored(Rejection::Stale)
    );
    assert_eq!(
        session.reduce(SessionAction::Complete {
            generation,
            outcome: outcome("https://a.test/1", 1),
        }),
        Transition::Ignored(Rejection::Stale)
    );
    assert!(session.progress().is_empty());
    assert!(session.results().is_empty());
    assert_eq!(session.step(), CheckoutStep::Cart);
}

#[test]
fn stale_generation_from_previous_attempt_is_ignored() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let first = begin(&mut session, items.clone());
    session.reduce(SessionAction::BackToCart);
    session.reduce(SessionAction::ProceedToReview {
        items: items.clone(),
    });
    session.reduce(SessionAction::ProceedToPayment);
    let second = begin(&mut session, items);
    assert_ne!(first, second);

    assert_eq!(
        session.reduce(SessionAction::Complete {
            generation: first,
            outcome: outcome("https://a.test/1", 1),
        }),
        Transition::Ignored(Rejection::Stale)
    );
    assert!(session.is_in_flight());
}

#[test]
fn reset_after_done_clears_results_and_snapshot() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items);
    session.reduce(SessionAction::Complete {
        generation,
        outcome: outcome("https://a.test/1", 1),
    });

    session.reduce(SessionAction::Reset);

    assert_eq!(session.step(), CheckoutStep::Cart);
    assert!(session.results().is_empty());
    assert!(session.purchased().is_empty());
    assert_eq!(session.summary(), None);
    assert!(session.generation() > generation);
}

#[test]
fn done_event_delivered_as_progress_completes_the_attempt() {
    let items = vec![item("https://a.test/1", 3, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items);

    session.reduce(SessionAction::Progress {
        generation,
        event: ProgressEvent::Done(outcome("https://a.test/1", 3)),
    });

    assert_eq!(session.step(), CheckoutStep::Done);
    assert_eq!(session.results()[0].quantity, 3);
}

#[test]
fn leaving_done_starts_over_without_previous_results() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items.clone());
    session.reduce(SessionAction::Complete {
        generation,
        outcome: outcome("https://a.test/1", 1),
    });

    assert!(session.reduce(SessionAction::BackToCart).is_applied());
    assert!(session
        .reduce(SessionAction::ProceedToReview { items })
        .is_applied());

    assert_eq!(session.step(), CheckoutStep::Review);
    assert!(session.results().is_empty());
    assert_eq!(session.summary(), None);
    assert!(session.purchased().is_empty());
    assert!(session.generation() > generation);
}

#[test]
fn new_attempt_drops_previous_purchase_snapshot() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items.clone());
    session.reduce(SessionAction::Complete {
        generation,
        outcome: outcome("https://a.test/1", 1),
    });
    session.purchased = items.clone();
    session.step = CheckoutStep::Payment;

    begin(&mut session, items);

    assert!(session.purchased().is_empty());
    assert!(session.results().is_empty());
}

#[test]
fn progress_for_unknown_items_is_dropped() {
    let items = vec![item("https://a.test/1", 1, "A")];
    let mut session = session_at_payment(items.clone());
    let generation = begin(&mut session, items);

    let events = [
        ProgressEvent::RetailerStart(RetailerStart {
            index: 1,
            brand: "Ghost".into(),
        }),
        ProgressEvent::Step(StepAdvanced {
            item_index: 5,
            step_index: 0,
        }),
        ProgressEvent::RetailerDone(RetailerDone { index: 1 }),
    ];
    for event in events {
        assert_eq!(
            session.reduce(SessionAction::Progress { generation, event }),
            Transition::Ignored(Rejection::UnknownItem)
        );
    }
    assert!(session.progress().is_empty());
    assert!(session.is_in_flight());
}
