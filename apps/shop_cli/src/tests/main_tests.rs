use super::*;
use std::time::Duration;

use client_core::ApiEndpoints;
use serde_json::json;

fn cart_line_products() -> Vec<CartLine> {
    serde_json::from_value(json!([
        { "product": { "id": "a", "name": "Kettle", "brand": "Brewco", "url": "https://a.test/1" }, "quantity": 2 },
        { "product": { "id": "b", "name": "Mug", "brand": "Clay" } }
    ]))
    .expect("cart lines")
}

#[test]
fn cart_lines_default_to_one() {
    let lines = cart_line_products();
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[1].quantity, 1);
}

#[tokio::test]
async fn renderer_prints_queued_snapshots_through_done() {
    let mut cart = Cart::new();
    for line in cart_line_products() {
        cart.set_product_quantity(line.product, line.quantity);
    }
    let endpoints = ApiEndpoints::parse("http://127.0.0.1:1").expect("endpoints");
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    let client = CheckoutClient::new(
        CheckoutTransport::new(http, &endpoints, true),
        Simulator::new(Duration::ZERO),
        Arc::new(Mutex::new(cart)),
    );
    let renderer = tokio::spawn(render_progress(client.subscribe(), Vec::new()));

    assert!(client.proceed_to_review().await.is_applied());
    assert!(client.proceed_to_payment().await.is_applied());
    client
        .execute(&CheckoutForm::default())
        .await
        .expect("execute");
    drop(client);

    let out = renderer.await.expect("join").expect("write");
    let lines: Vec<String> = String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines.first().map(String::as_str), Some("[review]"));
    assert!(lines.iter().any(|line| line == "[payment] #1 Brewco: 3/3 done"));
    assert_eq!(lines.last().map(String::as_str), Some("[done]"));
}
