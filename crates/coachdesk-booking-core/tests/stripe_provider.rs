//! Stripe client tests against a mock HTTP server

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coachdesk_booking_core::{
    BookingError, CheckoutMetadata, CheckoutParams, PaymentProvider, PaymentStatus,
    StripeConfig, StripeProvider,
};
use coachdesk_types::{ProductId, ReservationId};

// base64("sk_test_123:")
const BASIC_AUTH: &str = "Basic c2tfdGVzdF8xMjM6";

fn provider(server: &MockServer) -> StripeProvider {
    StripeProvider::new(StripeConfig::new("sk_test_123", "whsec_unused").with_api_base(server.uri()))
}

fn params(reservation_id: ReservationId) -> CheckoutParams {
    CheckoutParams {
        product_name: "Strategy Coaching".to_string(),
        amount_cents: 9900,
        currency: "eur".to_string(),
        success_url: "https://coach.example.org/payment/success?session_id={CHECKOUT_SESSION_ID}"
            .to_string(),
        cancel_url: "https://coach.example.org/payment/cancel".to_string(),
        customer_email: Some("anna@coaching-kunde.de".to_string()),
        client_reference_id: Some(reservation_id.to_string()),
        metadata: CheckoutMetadata {
            reservation_id: Some(reservation_id),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_create_checkout_session() {
    let server = MockServer::start().await;
    let reservation_id = ReservationId::new();

    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("mode=payment"))
        .and(body_string_contains("unit_amount%5D=9900"))
        .and(body_string_contains(format!(
            "metadata%5Breservation_id%5D={reservation_id}"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_a1",
            "object": "checkout.session",
            "url": "https://checkout.stripe.com/c/pay/cs_test_a1",
            "payment_status": "unpaid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = provider(&server)
        .create_checkout_session(&params(reservation_id))
        .await
        .unwrap();

    assert_eq!(session.session_id, "cs_test_a1");
    assert_eq!(session.url, "https://checkout.stripe.com/c/pay/cs_test_a1");
}

#[tokio::test]
async fn test_create_without_url_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cs_test_a2" })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .create_checkout_session(&params(ReservationId::new()))
        .await
        .unwrap_err();
    assert!(err.is_provider_error());
}

#[tokio::test]
async fn test_stripe_error_status_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": { "type": "card_error", "message": "Your card was declined." }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .create_checkout_session(&params(ReservationId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ProviderError(ref m) if m.contains("402")));
}

#[tokio::test]
async fn test_retrieve_paid_session() {
    let server = MockServer::start().await;
    let reservation_id = ReservationId::new();
    let product_id = ProductId::new();

    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_test_b1"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_b1",
            "object": "checkout.session",
            "url": null,
            "payment_status": "paid",
            "customer_email": null,
            "customer_details": { "email": "anna@coaching-kunde.de", "name": "Anna" },
            "amount_total": 9900,
            "currency": "eur",
            "client_reference_id": reservation_id.to_string(),
            "metadata": {
                "product_id": product_id.to_string(),
                "booking_date": "2025-09-10",
                "booking_time": "14:00",
                "duration_minutes": "60",
                "booking_token": "tok_abc"
            }
        })))
        .mount(&server)
        .await;

    let session = provider(&server)
        .retrieve_checkout_session("cs_test_b1")
        .await
        .unwrap();

    assert_eq!(session.payment_status, PaymentStatus::Paid);
    assert_eq!(session.customer_email.as_deref(), Some("anna@coaching-kunde.de"));
    assert_eq!(session.amount_total, Some(9900));
    assert_eq!(session.metadata.product_id, Some(product_id));
    assert_eq!(session.metadata.duration_minutes, Some(60));
    // Falls back to client_reference_id when metadata lacks it
    assert_eq!(session.reservation_id(), Some(reservation_id));
}

#[tokio::test]
async fn test_retrieve_unknown_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checkout/sessions/cs_test_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "type": "invalid_request_error", "message": "No such checkout.session" }
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .retrieve_checkout_session("cs_test_missing")
        .await
        .unwrap_err();
    assert!(err.is_provider_error());
}
