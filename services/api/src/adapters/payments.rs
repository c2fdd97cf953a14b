//! services/api/src/adapters/payments.rs
//!
//! This module contains the payment gateway adapter, the concrete
//! implementation of the `PaymentGateway` port against the Stripe Checkout
//! API. Stripe's v1 endpoints take form-encoded bodies and answer with JSON.

use async_trait::async_trait;
use coursehub_core::domain::PaymentStatus;
use coursehub_core::ports::{
    CheckoutRequest, GatewaySession, PaymentGateway, PortError, PortResult, SessionDetails,
};
use serde::Deserialize;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// A payment gateway adapter that implements the `PaymentGateway` port.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
}

impl StripeGateway {
    /// Creates a new `StripeGateway`.
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
    amount_total: Option<i64>,
    customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

/// Flattens a checkout request into Stripe's bracketed form parameters.
fn session_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.title.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            request.description.clone(),
        ),
        (
            "client_reference_id".to_string(),
            request.course_id.to_string(),
        ),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ]
}

fn parse_session(body: &str) -> PortResult<CheckoutSessionResponse> {
    serde_json::from_str::<CheckoutSessionResponse>(body)
        .map_err(|e| PortError::Upstream(format!("invalid gateway response: {e}; body={body}")))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: CheckoutRequest) -> PortResult<GatewaySession> {
        let resp = self
            .client
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&session_form(&request))
            .send()
            .await
            .map_err(|e| PortError::Upstream(format!("gateway http error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PortError::Upstream(format!("gateway http error: {e}")))?;

        if !status.is_success() {
            return Err(PortError::Upstream(format!(
                "gateway error status={status} body={body}"
            )));
        }

        let session = parse_session(&body)?;
        let url = session.url.ok_or_else(|| {
            PortError::Upstream("gateway session came back without a redirect url".to_string())
        })?;

        Ok(GatewaySession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> PortResult<Option<SessionDetails>> {
        let resp = self
            .client
            .get(format!("{STRIPE_API_BASE}/checkout/sessions/{session_id}"))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PortError::Upstream(format!("gateway http error: {e}")))?;

        // Stripe answers 404 for session ids it has never issued.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PortError::Upstream(format!("gateway http error: {e}")))?;

        if !status.is_success() {
            return Err(PortError::Upstream(format!(
                "gateway error status={status} body={body}"
            )));
        }

        let session = parse_session(&body)?;
        let payment_status = session
            .payment_status
            .as_deref()
            .unwrap_or("unpaid")
            .parse::<PaymentStatus>()
            .map_err(PortError::Upstream)?;

        Ok(Some(SessionDetails {
            status: payment_status,
            amount_total: session.amount_total.unwrap_or(0),
            customer_email: session.customer_details.and_then(|details| details.email),
        }))
    }
}
