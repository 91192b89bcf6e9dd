// storefront/src/services/signature.rs

//! Verification of signed payment notifications.
//!
//! The header carries `t=<unix seconds>` and one or more `v1=<hex>` entries.
//! Each `v1` is an HMAC-SHA256 over `"{t}.{raw body}"` keyed by the webhook
//! secret. Verification is pure: the current time is a parameter.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
  #[error("signature header is malformed")]
  MalformedHeader,

  #[error("signature header has no timestamp")]
  MissingTimestamp,

  #[error("signature header has no v1 signatures")]
  NoSignatures,

  #[error("timestamp {timestamp} is outside the {tolerance_secs}s tolerance")]
  TimestampOutOfTolerance { timestamp: i64, tolerance_secs: i64 },

  #[error("no signature matches the payload")]
  Mismatch,

  #[error("verified payload is not a valid event: {0}")]
  InvalidPayload(String),
}

/// A notification whose signature has been checked.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedEvent {
  #[serde(default)]
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
  pub object: JsonValue,
}

/// The parts of a checkout session object the settlement path reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSessionObject {
  #[serde(default)]
  pub id: String,
  pub payment_status: Option<String>,
  pub amount_total: Option<i64>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
}

impl VerifiedEvent {
  pub fn checkout_session(&self) -> Result<CheckoutSessionObject, VerificationError> {
    serde_json::from_value(self.data.object.clone()).map_err(|e| VerificationError::InvalidPayload(e.to_string()))
  }
}

#[derive(Clone)]
pub struct SignatureVerifier {
  secret: String,
  tolerance_secs: i64,
}

impl std::fmt::Debug for SignatureVerifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SignatureVerifier")
      .field("secret", &"[REDACTED]")
      .field("tolerance_secs", &self.tolerance_secs)
      .finish()
  }
}

struct ParsedHeader {
  timestamp: i64,
  signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader, VerificationError> {
  let mut timestamp = None;
  let mut signatures = Vec::new();

  for part in header.split(',') {
    let (key, value) = part.trim().split_once('=').ok_or(VerificationError::MalformedHeader)?;
    match key {
      "t" => {
        let parsed = value.parse::<i64>().map_err(|_| VerificationError::MalformedHeader)?;
        timestamp = Some(parsed);
      }
      // Entries that are not valid hex can never match; skip them.
      "v1" => {
        if let Ok(bytes) = hex::decode(value) {
          signatures.push(bytes);
        }
      }
      _ => {}
    }
  }

  let timestamp = timestamp.ok_or(VerificationError::MissingTimestamp)?;
  if signatures.is_empty() {
    return Err(VerificationError::NoSignatures);
  }
  Ok(ParsedHeader { timestamp, signatures })
}

fn keyed_mac(secret: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256, VerificationError> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| VerificationError::Mismatch)?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(body);
  Ok(mac)
}

impl SignatureVerifier {
  pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
    Self {
      secret: secret.into(),
      tolerance_secs,
    }
  }

  /// Authenticates `raw_body` against `header`, then parses it as an event.
  pub fn verify(&self, raw_body: &[u8], header: &str, now_unix: i64) -> Result<VerifiedEvent, VerificationError> {
    let parsed = parse_header(header)?;

    if now_unix.abs_diff(parsed.timestamp) > self.tolerance_secs.unsigned_abs() {
      return Err(VerificationError::TimestampOutOfTolerance {
        timestamp: parsed.timestamp,
        tolerance_secs: self.tolerance_secs,
      });
    }

    let mac = keyed_mac(&self.secret, parsed.timestamp, raw_body)?;
    let matched = parsed
      .signatures
      .iter()
      .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if !matched {
      return Err(VerificationError::Mismatch);
    }

    serde_json::from_slice(raw_body).map_err(|e| VerificationError::InvalidPayload(e.to_string()))
  }
}

/// Produces a `t=..,v1=..` header for `body`, as the gateway would send it.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, VerificationError> {
  let mac = keyed_mac(secret, timestamp, body)?;
  Ok(format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes())))
}
