// storefront/src/services/mod.rs

pub mod identity;
pub mod payment_gateway;
pub mod payment_mock;
pub mod signature;

pub use identity::{IdentityProvider, PgIdentity, StaticIdentity};
pub use payment_gateway::{GatewayError, HostedSession, PaymentGateway, SessionLine, SessionRequest, StripeGateway};
pub use payment_mock::MockGateway;
pub use signature::{SignatureVerifier, VerificationError, VerifiedEvent};
