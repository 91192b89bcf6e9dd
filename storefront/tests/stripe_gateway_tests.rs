// storefront/tests/stripe_gateway_tests.rs
mod common;

use std::time::Duration;

use serde_json::json;
use storefront::services::{GatewayError, PaymentGateway, SessionLine, SessionRequest, StripeGateway};
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(order_id: Uuid) -> SessionRequest {
  SessionRequest {
    order_id,
    user_id: "user-1".to_string(),
    currency: "usd".to_string(),
    success_url: SessionRequest::success_url_for("https://shop.test/", order_id),
    cancel_url: SessionRequest::cancel_url_for("https://shop.test/"),
    lines: vec![SessionLine {
      product_id: "p1".to_string(),
      name: "Beeswax Wrap".to_string(),
      description: "Reusable".to_string(),
      images: vec!["https://img.test/a.jpg".to_string()],
      unit_amount: 1299,
      quantity: 2,
    }],
  }
}

fn gateway(server: &MockServer) -> StripeGateway {
  StripeGateway::new("sk_test_123", server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn posts_form_encoded_session_with_metadata_and_idempotency_key() {
  common::setup_tracing();
  let server = MockServer::start().await;
  let order_id = Uuid::new_v4();

  Mock::given(method("POST"))
    .and(path("/v1/checkout/sessions"))
    .and(header("authorization", "Bearer sk_test_123"))
    .and(header("idempotency-key", format!("checkout-{order_id}").as_str()))
    .and(body_string_contains("mode=payment"))
    .and(body_string_contains(format!("metadata%5BorderId%5D={order_id}").as_str()))
    .and(body_string_contains("metadata%5BuserId%5D=user-1"))
    .and(body_string_contains("line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=1299"))
    .and(body_string_contains("line_items%5B0%5D%5Bquantity%5D=2"))
    .and(body_string_contains("line_items%5B0%5D%5Bprice_data%5D%5Bproduct_data%5D%5Bimages%5D%5B0%5D="))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "id": "cs_test_abc",
      "url": "https://checkout.stripe.test/c/pay/cs_test_abc"
    })))
    .expect(1)
    .mount(&server)
    .await;

  let session = gateway(&server).create_checkout_session(&request(order_id)).await.unwrap();

  assert_eq!(session.id, "cs_test_abc");
  assert_eq!(session.url, "https://checkout.stripe.test/c/pay/cs_test_abc");
}

#[tokio::test]
async fn redirect_urls_embed_order_and_session_placeholder() {
  let order_id = Uuid::new_v4();
  let req = request(order_id);
  assert_eq!(
    req.success_url,
    format!("https://shop.test/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&order_id={order_id}")
  );
  assert_eq!(req.cancel_url, "https://shop.test/checkout?canceled=true");
  assert!(req
    .form_fields()
    .contains(&("client_reference_id".to_string(), order_id.to_string())));
}

#[tokio::test]
async fn non_success_status_is_rejected_with_provider_message() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(402).set_body_json(json!({
      "error": { "type": "card_error", "message": "Your card was declined." }
    })))
    .mount(&server)
    .await;

  let err = gateway(&server)
    .create_checkout_session(&request(Uuid::new_v4()))
    .await
    .unwrap_err();

  match err {
    GatewayError::Rejected { status, message } => {
      assert_eq!(status, 402);
      assert_eq!(message, "Your card was declined.");
    }
    other => panic!("expected Rejected, got {other:?}"),
  }
}

#[tokio::test]
async fn response_without_url_is_malformed() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cs_test_abc" })))
    .mount(&server)
    .await;

  let err = gateway(&server)
    .create_checkout_session(&request(Uuid::new_v4()))
    .await
    .unwrap_err();

  assert!(matches!(err, GatewayError::MalformedResponse(_)));
}

#[tokio::test]
async fn slow_gateway_hits_the_timeout_as_a_transport_error() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({ "id": "cs", "url": "https://x" }))
        .set_delay(Duration::from_secs(2)),
    )
    .mount(&server)
    .await;

  let gateway = StripeGateway::new("sk_test_123", server.uri(), Duration::from_millis(200)).unwrap();
  let err = gateway.create_checkout_session(&request(Uuid::new_v4())).await.unwrap_err();

  assert!(matches!(err, GatewayError::Transport(_)));
}
