//! The ECDSA keypair value object and its verification-method import/export.

use chrono::{DateTime, Utc};

use crate::encoding::base58btc_encode;
use crate::error::{Error, Result};
use crate::jwk::JsonWebKey;
use crate::key::{Curve, KeyFlag, PublicKey, SecretKey};
use crate::verification::{
    JsonWebKeyMethod, MultikeyMethod, VerificationMethod, JWK_CONTEXT, MULTIKEY_CONTEXT,
};

/// Verification-method shape to export a keypair into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodType {
    Multikey,
    JsonWebKey,
}

/// Options for [`ECKeypair::export`].
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Which verification-method shape to produce
    pub method_type: MethodType,
    /// Which half of the pair to emit
    pub flag: KeyFlag,
}

/// Options for [`ECKeypair::import`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Expected curve; mismatch fails the import
    pub curve: Option<Curve>,
    /// Require the verification method to carry its canonical `@context`
    pub check_context: bool,
    /// Fail when `expires` lies in the past
    pub check_expired: bool,
    /// Fail when `revoked` lies in the past
    pub check_revoked: bool,
}

/// An ECDSA keypair bound to an optional controller identity.
///
/// Either half of the pair may be absent; operations that need a missing
/// half fail explicitly instead of deriving it.
#[derive(Debug, Clone)]
pub struct ECKeypair {
    /// Curve both halves live on
    pub curve: Curve,
    /// Identifier, normally `<controller>#<fingerprint>`
    pub id: Option<String>,
    /// Controller URI
    pub controller: Option<String>,
    /// Expiry timestamp
    pub expires: Option<DateTime<Utc>>,
    /// Revocation timestamp
    pub revoked: Option<DateTime<Utc>>,
    /// Public key handle
    pub public_key: Option<PublicKey>,
    /// Secret key handle
    pub secret_key: Option<SecretKey>,
}

impl ECKeypair {
    /// Create an empty keypair shell for the given curve.
    pub fn new(curve: Curve) -> Self {
        Self {
            curve,
            id: None,
            controller: None,
            expires: None,
            revoked: None,
            public_key: None,
            secret_key: None,
        }
    }

    /// Generate a fresh keypair on the given curve.
    pub fn generate(curve: Curve) -> Self {
        let secret_key = SecretKey::generate(curve);
        let public_key = secret_key.public_key();
        Self {
            public_key: Some(public_key),
            secret_key: Some(secret_key),
            ..Self::new(curve)
        }
    }

    /// Generate fresh key material and derive `id` from the controller.
    ///
    /// Replaces any existing key material. When `controller` is set and `id`
    /// is not, `id` becomes `<controller>#<fingerprint>`.
    pub fn initialize(&mut self) -> Result<()> {
        let secret_key = SecretKey::generate(self.curve);
        self.public_key = Some(secret_key.public_key());
        self.secret_key = Some(secret_key);
        self.ensure_id()
    }

    /// Compute the public-key fingerprint.
    ///
    /// The fingerprint is the `z`-prefixed base58btc encoding of the
    /// multicodec prefix followed by the compressed public point. It depends
    /// only on the curve and the point, never on the in-memory
    /// representation.
    pub fn generate_fingerprint(&self) -> Result<String> {
        let public_key = self.public_key.as_ref().ok_or_else(|| {
            Error::InvalidKeypairContent("fingerprint requires a public key".to_string())
        })?;
        Ok(base58btc_encode(&public_key.multicodec_bytes()))
    }

    /// Check a fingerprint against this keypair's public key.
    pub fn verify_fingerprint(&self, fingerprint: &str) -> bool {
        self.generate_fingerprint()
            .map(|own| own == fingerprint)
            .unwrap_or(false)
    }

    /// Export the keypair as a verification method.
    pub fn export(&self, options: &ExportOptions) -> Result<VerificationMethod> {
        if options.flag == KeyFlag::Secret && self.secret_key.is_none() {
            return Err(Error::InvalidKeypairContent(
                "cannot export secret key: none present".to_string(),
            ));
        }
        if options.flag == KeyFlag::Public && self.public_key.is_none() {
            return Err(Error::InvalidKeypairContent(
                "cannot export public key: none present".to_string(),
            ));
        }

        // The secret flag emits both halves when both are present; the
        // public flag never emits the secret half.
        let public_key = self.public_key.as_ref();
        let secret_key = match options.flag {
            KeyFlag::Secret => self.secret_key.as_ref(),
            KeyFlag::Public => None,
        };

        let controller = self.controller.clone().unwrap_or_default();
        let expires = self.expires.map(|t| t.to_rfc3339());
        let revoked = self.revoked.map(|t| t.to_rfc3339());

        match options.method_type {
            MethodType::Multikey => {
                let id = match &self.id {
                    Some(id) => id.clone(),
                    None => format!("{controller}#{}", self.generate_fingerprint()?),
                };
                Ok(VerificationMethod::Multikey(MultikeyMethod {
                    context: Some(MULTIKEY_CONTEXT.to_string()),
                    id,
                    controller,
                    expires,
                    revoked,
                    public_key_multibase: public_key.map(|k| k.to_multikey()).transpose()?,
                    secret_key_multibase: secret_key.map(|k| k.to_multikey()).transpose()?,
                }))
            }
            MethodType::JsonWebKey => {
                let public_key_jwk = public_key.map(JsonWebKey::from_public_key);
                let secret_key_jwk = secret_key.map(JsonWebKey::from_secret_key).transpose()?;

                // The JWK shape identifies keys by thumbprint, not by
                // fingerprint.
                let id = match &public_key_jwk {
                    Some(jwk) => format!("{controller}#{}", jwk.thumbprint()),
                    None => self.id.clone().ok_or_else(|| {
                        Error::InvalidKeypairContent(
                            "cannot derive an id without a public key".to_string(),
                        )
                    })?,
                };

                Ok(VerificationMethod::JsonWebKey(JsonWebKeyMethod {
                    context: Some(JWK_CONTEXT.to_string()),
                    id,
                    controller,
                    expires,
                    revoked,
                    public_key_jwk,
                    secret_key_jwk,
                }))
            }
        }
    }

    /// Import a verification method into a keypair.
    pub fn import(method: &VerificationMethod, options: &ImportOptions) -> Result<Self> {
        if options.check_context {
            let expected = match method {
                VerificationMethod::Multikey(_) => MULTIKEY_CONTEXT,
                VerificationMethod::JsonWebKey(_) => JWK_CONTEXT,
            };
            if method.context() != Some(expected) {
                return Err(Error::KeypairImport(format!(
                    "verification method is missing the {expected} context"
                )));
            }
        }

        let (public_key, secret_key) = match method {
            VerificationMethod::Multikey(m) => {
                let public_key = m
                    .public_key_multibase
                    .as_deref()
                    .map(PublicKey::from_multikey)
                    .transpose()?;
                let secret_key = m
                    .secret_key_multibase
                    .as_deref()
                    .map(SecretKey::from_multikey)
                    .transpose()?;
                (public_key, secret_key)
            }
            VerificationMethod::JsonWebKey(m) => {
                let public_key = m
                    .public_key_jwk
                    .as_ref()
                    .map(JsonWebKey::to_public_key)
                    .transpose()?;
                let secret_key = m
                    .secret_key_jwk
                    .as_ref()
                    .map(JsonWebKey::to_secret_key)
                    .transpose()?;
                (public_key, secret_key)
            }
        };

        let curve = match (&public_key, &secret_key) {
            (Some(public), Some(secret)) => {
                if public.curve() != secret.curve() {
                    return Err(Error::InvalidKeypairContent(
                        "public and secret keys disagree on curve".to_string(),
                    ));
                }
                public.curve()
            }
            (Some(public), None) => public.curve(),
            (None, Some(secret)) => secret.curve(),
            (None, None) => {
                return Err(Error::InvalidKeypairContent(
                    "verification method carries no key material".to_string(),
                ));
            }
        };

        if let Some(expected) = options.curve {
            if curve != expected {
                return Err(Error::InvalidKeypairContent(format!(
                    "curve mismatch: expected {expected}, got {curve}"
                )));
            }
        }

        let id = method.id().to_string();
        let controller = method.controller().to_string();
        if !controller.is_empty() && !id.starts_with(&controller) {
            return Err(Error::InvalidKeypairContent(format!(
                "id `{id}` does not begin with controller `{controller}`"
            )));
        }

        let expires = parse_timestamp(method.expires())?;
        let revoked = parse_timestamp(method.revoked())?;
        let now = Utc::now();
        if options.check_expired {
            if let Some(expires) = expires {
                if expires < now {
                    return Err(Error::KeypairExpired(format!(
                        "verification method expired at {expires}"
                    )));
                }
            }
        }
        if options.check_revoked {
            if let Some(revoked) = revoked {
                if revoked <= now {
                    return Err(Error::KeypairExpired(format!(
                        "verification method revoked at {revoked}"
                    )));
                }
            }
        }

        Ok(Self {
            curve,
            id: Some(id),
            controller: (!controller.is_empty()).then_some(controller),
            expires,
            revoked,
            public_key,
            secret_key,
        })
    }

    fn ensure_id(&mut self) -> Result<()> {
        if self.id.is_none() {
            if let Some(controller) = &self.controller {
                self.id = Some(format!("{controller}#{}", self.generate_fingerprint()?));
            }
        }
        Ok(())
    }
}

fn parse_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| Error::KeypairImport(format!("invalid timestamp `{s}`: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const CONTROLLER: &str = "did:example:issuer";

    fn initialized(curve: Curve) -> ECKeypair {
        let mut keypair = ECKeypair::new(curve);
        keypair.controller = Some(CONTROLLER.to_string());
        keypair.initialize().unwrap();
        keypair
    }

    #[test]
    fn test_initialize_derives_id_from_fingerprint() {
        let keypair = initialized(Curve::P256);
        let fingerprint = keypair.generate_fingerprint().unwrap();
        assert!(fingerprint.starts_with('z'));
        assert_eq!(keypair.id.as_deref(), Some(&*format!("{CONTROLLER}#{fingerprint}")));
    }

    #[test]
    fn test_fingerprint_round_trip() {
        for curve in [Curve::P256, Curve::P384] {
            let keypair = initialized(curve);
            let fingerprint = keypair.generate_fingerprint().unwrap();
            assert!(keypair.verify_fingerprint(&fingerprint));
            assert!(!keypair.verify_fingerprint("zDnaeBogus"));
        }
    }

    #[test]
    fn test_generate_produces_both_halves() {
        let keypair = ECKeypair::generate(Curve::P384);
        assert!(keypair.public_key.is_some());
        assert!(keypair.secret_key.is_some());
        assert!(keypair.id.is_none());
        let fingerprint = keypair.generate_fingerprint().unwrap();
        assert!(keypair.verify_fingerprint(&fingerprint));
    }

    #[test]
    fn test_fingerprint_requires_public_key() {
        let keypair = ECKeypair::new(Curve::P256);
        assert!(matches!(
            keypair.generate_fingerprint(),
            Err(Error::InvalidKeypairContent(_))
        ));
        assert!(!keypair.verify_fingerprint("zanything"));
    }

    #[test]
    fn test_multikey_export_import_round_trip() {
        for curve in [Curve::P256, Curve::P384] {
            let keypair = initialized(curve);
            let method = keypair
                .export(&ExportOptions {
                    method_type: MethodType::Multikey,
                    flag: KeyFlag::Secret,
                })
                .unwrap();

            let imported = ECKeypair::import(&method, &ImportOptions::default()).unwrap();
            assert_eq!(imported.curve, curve);
            assert_eq!(imported.id, keypair.id);
            assert_eq!(imported.controller, keypair.controller);
            assert_eq!(imported.public_key, keypair.public_key);
            assert!(imported.secret_key.is_some());
        }
    }

    #[test]
    fn test_jwk_export_import_round_trip() {
        for curve in [Curve::P256, Curve::P384] {
            let keypair = initialized(curve);
            let method = keypair
                .export(&ExportOptions {
                    method_type: MethodType::JsonWebKey,
                    flag: KeyFlag::Secret,
                })
                .unwrap();

            let VerificationMethod::JsonWebKey(jwk_method) = &method else {
                panic!("expected a JsonWebKey method");
            };
            let thumbprint = jwk_method.public_key_jwk.as_ref().unwrap().thumbprint();
            assert_eq!(jwk_method.id, format!("{CONTROLLER}#{thumbprint}"));
            assert!(jwk_method.secret_key_jwk.as_ref().unwrap().d.is_some());
            assert!(jwk_method.public_key_jwk.as_ref().unwrap().d.is_none());

            let imported = ECKeypair::import(&method, &ImportOptions::default()).unwrap();
            assert_eq!(imported.curve, curve);
            assert_eq!(imported.public_key, keypair.public_key);
            assert!(imported.secret_key.is_some());
        }
    }

    #[test]
    fn test_export_missing_half_fails() {
        let mut keypair = initialized(Curve::P256);
        keypair.secret_key = None;
        assert!(matches!(
            keypair.export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Secret,
            }),
            Err(Error::InvalidKeypairContent(_))
        ));

        let mut keypair = initialized(Curve::P256);
        keypair.public_key = None;
        assert!(matches!(
            keypair.export(&ExportOptions {
                method_type: MethodType::JsonWebKey,
                flag: KeyFlag::Public,
            }),
            Err(Error::InvalidKeypairContent(_))
        ));
    }

    #[test]
    fn test_public_export_never_carries_secret() {
        let keypair = initialized(Curve::P256);
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();
        let VerificationMethod::Multikey(m) = &method else {
            panic!("expected a Multikey method");
        };
        assert!(m.public_key_multibase.is_some());
        assert!(m.secret_key_multibase.is_none());
    }

    #[test]
    fn test_import_empty_method_fails() {
        let method = VerificationMethod::Multikey(MultikeyMethod {
            context: Some(MULTIKEY_CONTEXT.to_string()),
            id: format!("{CONTROLLER}#key-1"),
            controller: CONTROLLER.to_string(),
            expires: None,
            revoked: None,
            public_key_multibase: None,
            secret_key_multibase: None,
        });
        assert!(matches!(
            ECKeypair::import(&method, &ImportOptions::default()),
            Err(Error::InvalidKeypairContent(_))
        ));
    }

    #[test]
    fn test_import_checks_id_against_controller() {
        let keypair = initialized(Curve::P256);
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();
        let VerificationMethod::Multikey(mut m) = method else {
            panic!("expected a Multikey method");
        };
        m.id = "did:example:other#key-1".to_string();
        assert!(matches!(
            ECKeypair::import(&VerificationMethod::Multikey(m), &ImportOptions::default()),
            Err(Error::InvalidKeypairContent(_))
        ));
    }

    #[test]
    fn test_import_curve_mismatch() {
        let keypair = initialized(Curve::P256);
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();
        assert!(matches!(
            ECKeypair::import(
                &method,
                &ImportOptions {
                    curve: Some(Curve::P384),
                    ..Default::default()
                }
            ),
            Err(Error::InvalidKeypairContent(_))
        ));
    }

    #[test]
    fn test_import_context_check() {
        let keypair = initialized(Curve::P256);
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();
        let VerificationMethod::Multikey(mut m) = method else {
            panic!("expected a Multikey method");
        };
        m.context = None;

        let method = VerificationMethod::Multikey(m);
        assert!(ECKeypair::import(&method, &ImportOptions::default()).is_ok());
        assert!(matches!(
            ECKeypair::import(
                &method,
                &ImportOptions {
                    check_context: true,
                    ..Default::default()
                }
            ),
            Err(Error::KeypairImport(_))
        ));
    }

    #[test]
    fn test_import_expiry_and_revocation_checks() {
        let mut keypair = initialized(Curve::P256);
        keypair.expires = Some(Utc::now() - Duration::hours(1));
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();

        // disabled checks never raise
        assert!(ECKeypair::import(&method, &ImportOptions::default()).is_ok());
        assert!(matches!(
            ECKeypair::import(
                &method,
                &ImportOptions {
                    check_expired: true,
                    ..Default::default()
                }
            ),
            Err(Error::KeypairExpired(_))
        ));

        let mut keypair = initialized(Curve::P256);
        keypair.revoked = Some(Utc::now() - Duration::hours(1));
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();
        assert!(matches!(
            ECKeypair::import(
                &method,
                &ImportOptions {
                    check_revoked: true,
                    ..Default::default()
                }
            ),
            Err(Error::KeypairExpired(_))
        ));
    }

    #[test]
    fn test_import_future_expiry_passes_check() {
        let mut keypair = initialized(Curve::P384);
        keypair.expires = Some(Utc::now() + Duration::days(30));
        let method = keypair
            .export(&ExportOptions {
                method_type: MethodType::Multikey,
                flag: KeyFlag::Public,
            })
            .unwrap();
        assert!(ECKeypair::import(
            &method,
            &ImportOptions {
                check_expired: true,
                ..Default::default()
            }
        )
        .is_ok());
    }
}
