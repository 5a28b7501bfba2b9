//! Request signing for the upstream's client-verification middleware.
//!
//! Every forwarded call carries a fresh millisecond timestamp and an
//! HMAC-SHA256 over `{client_id}:{timestamp}:{method}:{path}`, rendered as
//! lowercase hex. The body is not part of the signed message; the upstream
//! verifies exactly this string.

use anyhow::{anyhow, bail, Result};
use fingate_config::SecretString;
use fingate_core::{ClientIdentity, UpstreamMethod, CLIENT_DEVICE};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex signature for one request.
pub fn compute_signature(
    secret: &[u8],
    client_id: &str,
    timestamp: &str,
    method: UpstreamMethod,
    path: &str,
) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow!("Invalid HMAC key: {e}"))?;
    mac.update(format!("{client_id}:{timestamp}:{method}:{path}").as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// The signed envelope attached to one upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub timestamp: String,
    pub client_id: String,
    pub client_version: String,
    pub client_device: &'static str,
    pub signature: String,
    pub origin: String,
}

/// Holds the static identity and shared secret; produces a new envelope per call.
#[derive(Clone)]
pub struct RequestSigner {
    identity: ClientIdentity,
    secret: SecretString,
}

impl RequestSigner {
    /// Refuses to build a signer that would send unsigned or malformed requests.
    pub fn new(identity: ClientIdentity, secret: SecretString) -> Result<Self> {
        if secret.is_empty() {
            bail!("signing secret is empty");
        }
        for (name, value) in [
            ("client id", &identity.client_id),
            ("client version", &identity.client_version),
            ("client origin", &identity.origin),
        ] {
            if value.trim().is_empty() {
                bail!("{name} is empty");
            }
        }
        Ok(Self { identity, secret })
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Sign a call using the current wall-clock time.
    pub fn sign(&self, method: UpstreamMethod, path: &str) -> Result<SignedHeaders> {
        self.sign_at(chrono::Utc::now().timestamp_millis(), method, path)
    }

    /// Sign a call with an explicit epoch-millisecond timestamp.
    pub fn sign_at(
        &self,
        timestamp_ms: i64,
        method: UpstreamMethod,
        path: &str,
    ) -> Result<SignedHeaders> {
        let timestamp = timestamp_ms.to_string();
        let signature = compute_signature(
            self.secret.expose().as_bytes(),
            &self.identity.client_id,
            &timestamp,
            method,
            path,
        )?;

        Ok(SignedHeaders {
            timestamp,
            client_id: self.identity.client_id.clone(),
            client_version: self.identity.client_version.clone(),
            client_device: CLIENT_DEVICE,
            signature,
            origin: self.identity.origin.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"s3cret";

    fn signer() -> RequestSigner {
        RequestSigner::new(
            ClientIdentity {
                client_id: "web-client".into(),
                client_version: "2.4.0".into(),
                origin: "https://app.example.test".into(),
            },
            SecretString::new("s3cret"),
        )
        .unwrap()
    }

    #[test]
    fn matches_known_hmac_vector() {
        // HMAC-SHA256(key="key", "The quick brown fox jumps over the lazy dog")
        let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
        mac.update(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            hex::encode(mac.finalize().into_bytes()),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn signature_is_lowercase_hex_sha256() {
        let sig = compute_signature(SECRET, "web-client", "1700000000000", UpstreamMethod::Get, "/client/v2/wallet")
            .unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn signature_signs_the_documented_message() {
        let expected = {
            let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
            mac.update(b"web-client:1700000000000:POST:/client/v2/auth/signin");
            hex::encode(mac.finalize().into_bytes())
        };
        let sig = compute_signature(SECRET, "web-client", "1700000000000", UpstreamMethod::Post, "/client/v2/auth/signin")
            .unwrap();
        assert_eq!(sig, expected);
    }

    #[test]
    fn identical_inputs_reproduce() {
        let a = signer().sign_at(1_700_000_000_000, UpstreamMethod::Get, "/client/v2/loans").unwrap();
        let b = signer().sign_at(1_700_000_000_000, UpstreamMethod::Get, "/client/v2/loans").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn timestamp_changes_signature() {
        let a = signer().sign_at(1_700_000_000_000, UpstreamMethod::Get, "/client/v2/loans").unwrap();
        let b = signer().sign_at(1_700_000_000_001, UpstreamMethod::Get, "/client/v2/loans").unwrap();
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn each_input_changes_signature() {
        let ts = "1700000000000";
        let base = compute_signature(SECRET, "web-client", ts, UpstreamMethod::Get, "/client/v2/loans").unwrap();
        let variants = [
            compute_signature(SECRET, "web-client", ts, UpstreamMethod::Post, "/client/v2/loans").unwrap(),
            compute_signature(SECRET, "web-client", ts, UpstreamMethod::Get, "/client/v2/loan").unwrap(),
            compute_signature(SECRET, "web-clienT", ts, UpstreamMethod::Get, "/client/v2/loans").unwrap(),
            compute_signature(b"s3creT", "web-client", ts, UpstreamMethod::Get, "/client/v2/loans").unwrap(),
        ];
        for v in &variants {
            assert_ne!(&base, v);
        }
    }

    #[test]
    fn envelope_carries_static_markers() {
        let signed = signer().sign(UpstreamMethod::Get, "/client/v2/wallet").unwrap();
        assert_eq!(signed.client_device, "web");
        assert_eq!(signed.client_id, "web-client");
        assert_eq!(signed.client_version, "2.4.0");
        assert_eq!(signed.origin, "https://app.example.test");
        assert!(signed.timestamp.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn refuses_empty_secret() {
        let result = RequestSigner::new(signer().identity().clone(), SecretString::new(""));
        assert!(result.is_err());
    }
}
