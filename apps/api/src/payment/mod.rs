// Payment verification: consumes the verification endpoint that confirms a
// checkout session or payment intent was paid. Checkout creation lives outside
// this service.

pub mod handlers;
pub mod verifier;

pub use verifier::{
    HttpPaymentVerifier, PaymentError, PaymentVerification, PaymentVerifier, VerificationRequest,
};
