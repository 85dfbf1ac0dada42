//! Claim extraction and the ordered claim-validation sequence.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::{
    db_types::ShopDomain,
    helpers::extract_hostname,
    validator::ValidationError,
};

/// Clock-drift tolerance on the `iat` claim, in seconds.
pub(crate) const ISSUED_AT_TOLERANCE_SECS: i64 = 90;

/// The claim set exactly as it appears in the token payload, before any validation. Every field is
/// optional here; absence is reported by the validation sequence, not by deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawClaims {
    pub iss: Option<String>,
    pub dest: Option<String>,
    pub aud: Option<String>,
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub nbf: Option<i64>,
    pub iat: Option<i64>,
    pub jti: Option<String>,
    pub sid: Option<String>,
}

/// A fully validated session-token claim set. Holding one is proof that the signature verified and
/// every claim rule passed at `validate` time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokenClaims {
    /// The shop's admin URL.
    pub issuer: Url,
    /// The shop's storefront URL. Same hostname as `issuer`.
    pub destination: Url,
    /// The client id the token was minted for.
    pub audience: String,
    /// Opaque user id of the embedded-app viewer.
    pub subject: String,
    pub expires_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub jwt_id: String,
    pub session_id: String,
    /// The normalized shop domain, derived from `destination`.
    pub shop: ShopDomain,
}

impl RawClaims {
    /// Applies the claim rules as a single ordered sequence. The first violated rule determines the
    /// reported failure; a claim that is absent when a rule needs it reports `MissingRequiredClaim`.
    pub(crate) fn into_claims(
        self,
        expected_client_id: &str,
        allow_dev_domains: bool,
        now: DateTime<Utc>,
    ) -> Result<SessionTokenClaims, ValidationError> {
        let exp = self.exp.ok_or(ValidationError::MissingRequiredClaim("exp"))?;
        if exp <= now.timestamp() {
            return Err(ValidationError::Expired);
        }
        let nbf = self.nbf.ok_or(ValidationError::MissingRequiredClaim("nbf"))?;
        if nbf > now.timestamp() {
            return Err(ValidationError::NotYetValid);
        }
        let aud = self.aud.ok_or(ValidationError::MissingRequiredClaim("aud"))?;
        if aud != expected_client_id {
            return Err(ValidationError::WrongAudience);
        }
        let iat = self.iat.ok_or(ValidationError::MissingRequiredClaim("iat"))?;
        if (now.timestamp() - iat).abs() > ISSUED_AT_TOLERANCE_SECS {
            return Err(ValidationError::IssuedTooLongAgo);
        }
        let iss = self.iss.ok_or(ValidationError::MissingRequiredClaim("iss"))?;
        let dest = self.dest.ok_or(ValidationError::MissingRequiredClaim("dest"))?;
        let iss_host = extract_hostname(&iss).ok_or_else(|| ValidationError::InvalidShopDomain(iss.clone()))?;
        let dest_host = extract_hostname(&dest).ok_or_else(|| ValidationError::InvalidShopDomain(dest.clone()))?;
        if iss_host != dest_host {
            return Err(ValidationError::IssuerDestinationMismatch);
        }
        let shop = ShopDomain::parse(&dest_host, allow_dev_domains)
            .map_err(|e| ValidationError::InvalidShopDomain(e.0))?;
        let subject = self.sub.ok_or(ValidationError::MissingRequiredClaim("sub"))?;
        let jwt_id = self.jti.ok_or(ValidationError::MissingRequiredClaim("jti"))?;
        let session_id = self.sid.ok_or(ValidationError::MissingRequiredClaim("sid"))?;
        let issuer = parse_claim_url(&iss)?;
        let destination = parse_claim_url(&dest)?;
        Ok(SessionTokenClaims {
            issuer,
            destination,
            audience: aud,
            subject,
            expires_at: timestamp(exp),
            not_before: timestamp(nbf),
            issued_at: timestamp(iat),
            jwt_id,
            session_id,
            shop,
        })
    }
}

fn parse_claim_url(value: &str) -> Result<Url, ValidationError> {
    let candidate = if value.contains("://") { value.to_string() } else { format!("https://{value}") };
    Url::parse(&candidate).map_err(|_| ValidationError::InvalidShopDomain(value.to_string()))
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}
