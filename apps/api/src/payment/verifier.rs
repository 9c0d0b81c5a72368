//! Payment verification: pluggable verifier behind `Arc<dyn PaymentVerifier>`.
//!
//! Default: `HttpPaymentVerifier`, which posts the verification request to the
//! configured endpoint and reads back the verification result.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const VERIFY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment verification is not configured")]
    NotConfigured,

    #[error("Payment not completed (status: {payment_status})")]
    NotCompleted { payment_status: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Verification endpoint returned {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Identifies the payment to verify: a checkout session, or a payment intent
/// with its client secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationRequest {
    CheckoutSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    PaymentIntent {
        #[serde(rename = "paymentIntentId")]
        payment_intent_id: String,
        #[serde(rename = "clientSecret")]
        client_secret: String,
    },
}

impl VerificationRequest {
    /// The processor-side identifier recorded on the wizard state after unlock.
    pub fn reference(&self) -> &str {
        match self {
            VerificationRequest::CheckoutSession { session_id } => session_id,
            VerificationRequest::PaymentIntent {
                payment_intent_id, ..
            } => payment_intent_id,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.reference().trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    pub success: bool,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyErrorBody {
    error: String,
}

#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Returns the verification result. An unpaid payment is `Ok` with
    /// `success == false`; only transport or configuration problems are errors.
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<PaymentVerification, PaymentError>;
}

pub struct HttpPaymentVerifier {
    client: Client,
    endpoint: Option<String>,
}

impl HttpPaymentVerifier {
    pub fn new(endpoint: Option<String>) -> Result<Self, PaymentError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(VERIFY_TIMEOUT_SECS))
                .build()?,
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
        })
    }
}

#[async_trait]
impl PaymentVerifier for HttpPaymentVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<PaymentVerification, PaymentError> {
        let endpoint = self.endpoint.as_deref().ok_or(PaymentError::NotConfigured)?;

        let response = self.client.post(endpoint).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<VerifyErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!("Payment verification returned {}: {}", status, message);
            return Err(PaymentError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let verification: PaymentVerification = response.json().await?;
        info!(
            "Payment {} verified: success={}, status={}",
            request.reference(),
            verification.success,
            verification.payment_status
        );
        Ok(verification)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_request_shape() {
        let request: VerificationRequest =
            serde_json::from_str(r#"{"sessionId": "cs_test_123"}"#).unwrap();
        assert_eq!(
            request,
            VerificationRequest::CheckoutSession {
                session_id: "cs_test_123".to_string()
            }
        );
        assert_eq!(request.reference(), "cs_test_123");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"sessionId": "cs_test_123"})
        );
    }

    #[test]
    fn test_payment_intent_request_shape() {
        let request: VerificationRequest = serde_json::from_str(
            r#"{"paymentIntentId": "pi_42", "clientSecret": "pi_42_secret"}"#,
        )
        .unwrap();
        assert_eq!(request.reference(), "pi_42");
        assert!(matches!(
            request,
            VerificationRequest::PaymentIntent { ref client_secret, .. } if client_secret == "pi_42_secret"
        ));
    }

    #[test]
    fn test_payment_intent_without_client_secret_is_rejected() {
        assert!(serde_json::from_str::<VerificationRequest>(r#"{"paymentIntentId": "pi_42"}"#).is_err());
    }

    #[test]
    fn test_unknown_request_shape_is_rejected() {
        assert!(serde_json::from_str::<VerificationRequest>(r#"{"foo": "bar"}"#).is_err());
    }

    #[test]
    fn test_blank_reference() {
        let request = VerificationRequest::CheckoutSession {
            session_id: "  ".to_string(),
        };
        assert!(request.is_blank());
    }

    #[test]
    fn test_verification_response_parses_optional_fields() {
        let paid: PaymentVerification = serde_json::from_str(
            r#"{"success": true, "paymentStatus": "paid", "customerEmail": "a@b.co",
                "amountTotal": 500, "currency": "usd", "accessToken": "Y3NfMTIz"}"#,
        )
        .unwrap();
        assert!(paid.success);
        assert_eq!(paid.amount_total, Some(500));

        let unpaid: PaymentVerification =
            serde_json::from_str(r#"{"success": false, "paymentStatus": "unpaid"}"#).unwrap();
        assert!(!unpaid.success);
        assert!(unpaid.customer_email.is_none());
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_not_configured() {
        let verifier = HttpPaymentVerifier::new(None).unwrap();
        let request = VerificationRequest::CheckoutSession {
            session_id: "cs_1".to_string(),
        };
        assert!(matches!(
            verifier.verify(&request).await,
            Err(PaymentError::NotConfigured)
        ));
    }
}
