// src/services/two_factor.rs

use chrono::Utc;
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{LoginResponse, TwoFactorSetup, User},
    services::auth::AuthService,
};

type HmacSha1 = Hmac<Sha1>;

const STEP_SECS: u64 = 30;
const DIGITS: u32 = 6;
const SKEW: i64 = 1;
const SECRET_BYTES: usize = 20;

const MAX_FAILED_ATTEMPTS: u32 = 5;
const ATTEMPT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Capacidade de segundo fator (geração de segredo, URI e verificação).
pub trait OtpAuthenticator: Send + Sync {
    fn generate_secret(&self) -> String;
    fn provisioning_uri(&self, account: &str, secret: &str) -> String;
    fn verify(&self, secret: &str, token: &str) -> bool;
}

/// TOTP (RFC 6238): HMAC-SHA1, passo de 30 s, 6 dígitos, tolerância de ±1 passo.
pub struct TotpAuthenticator {
    issuer: String,
}

impl TotpAuthenticator {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Verificação com o relógio informado (segundos Unix).
    pub fn verify_at(&self, secret: &str, token: &str, unix_secs: u64) -> bool {
        let token = token.trim();
        if token.len() != DIGITS as usize || !token.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        let Some(key) = decode_secret(secret) else {
            return false;
        };

        let counter = (unix_secs / STEP_SECS) as i64;
        (-SKEW..=SKEW)
            .filter_map(|offset| u64::try_from(counter + offset).ok())
            .filter_map(|c| hotp(&key, c))
            .any(|code| code == token)
    }
}

impl OtpAuthenticator for TotpAuthenticator {
    fn generate_secret(&self) -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        BASE32_NOPAD.encode(&bytes)
    }

    fn provisioning_uri(&self, account: &str, secret: &str) -> String {
        let issuer = urlencoding::encode(&self.issuer);
        format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}",
            issuer,
            urlencoding::encode(account),
            secret,
            issuer
        )
    }

    fn verify(&self, secret: &str, token: &str) -> bool {
        let now = Utc::now().timestamp().max(0) as u64;
        self.verify_at(secret, token, now)
    }
}

fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    let cleaned: String = secret
        .trim()
        .to_ascii_uppercase()
        .chars()
        .filter(|c| *c != '=' && !c.is_whitespace())
        .collect();
    BASE32_NOPAD.decode(cleaned.as_bytes()).ok()
}

// HOTP com truncamento dinâmico (RFC 4226).
fn hotp(key: &[u8], counter: u64) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(key).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    Some(format!("{:0width$}", binary % 10u32.pow(DIGITS), width = DIGITS as usize))
}

/// O código só vale para quem tem 2FA ligado e um segredo que o aceite.
fn accepts_code(otp: &dyn OtpAuthenticator, user: &User, token: &str) -> bool {
    user.is_2fa_enabled
        && user
            .two_fa_secret
            .as_deref()
            .is_some_and(|secret| otp.verify(secret, token))
}

#[derive(Clone, Copy)]
struct FailedAttempts {
    count: u32,
    window_start: Instant,
}

/// Conta códigos errados por usuário dentro de uma janela fixa.
#[derive(Clone, Default)]
pub struct AttemptLimiter {
    failures: Arc<Mutex<HashMap<i32, FailedAttempts>>>,
}

impl AttemptLimiter {
    fn entries(&self) -> MutexGuard<'_, HashMap<i32, FailedAttempts>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn check(&self, user_id: i32, now: Instant) -> Result<(), AppError> {
        let mut entries = self.entries();
        let Some(&FailedAttempts { count, window_start }) = entries.get(&user_id) else {
            return Ok(());
        };
        if now.duration_since(window_start) >= ATTEMPT_WINDOW {
            entries.remove(&user_id);
            return Ok(());
        }
        if count >= MAX_FAILED_ATTEMPTS {
            return Err(AppError::TooManyAttempts(
                "Muitas tentativas. Aguarde alguns minutos e faça login novamente.".into(),
            ));
        }
        Ok(())
    }

    pub fn record_failure(&self, user_id: i32, now: Instant) {
        let mut entries = self.entries();
        let attempts = entries.entry(user_id).or_insert(FailedAttempts {
            count: 0,
            window_start: now,
        });
        if now.duration_since(attempts.window_start) >= ATTEMPT_WINDOW {
            attempts.count = 0;
            attempts.window_start = now;
        }
        attempts.count += 1;
    }

    pub fn clear(&self, user_id: i32) {
        self.entries().remove(&user_id);
    }
}

#[derive(Clone)]
pub struct TwoFactorService {
    user_repo: UserRepository,
    auth_service: AuthService,
    otp: Arc<dyn OtpAuthenticator>,
    attempts: AttemptLimiter,
}

impl TwoFactorService {
    pub fn new(
        user_repo: UserRepository,
        auth_service: AuthService,
        otp: Arc<dyn OtpAuthenticator>,
    ) -> Self {
        Self {
            user_repo,
            auth_service,
            otp,
            attempts: AttemptLimiter::default(),
        }
    }

    /// Gera e grava um segredo novo (o 2FA só liga depois do enable).
    pub async fn generate(&self, user: &User) -> Result<TwoFactorSetup, AppError> {
        let secret = self.otp.generate_secret();
        let qr_code_url = self.otp.provisioning_uri(&user.username, &secret);

        if !self.user_repo.set_two_fa_secret(user.id, &secret).await? {
            return Err(AppError::NotFound("Usuário não encontrado.".into()));
        }
        Ok(TwoFactorSetup {
            secret,
            qr_code_url,
        })
    }

    pub async fn enable(&self, user_id: i32, token: &str) -> Result<(), AppError> {
        // Relê do banco: o segredo do usuário autenticado pode ter acabado de mudar
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("Usuário não encontrado.".into()))?;

        let valid = user
            .two_fa_secret
            .as_deref()
            .is_some_and(|secret| self.otp.verify(secret, token));
        if !valid {
            return Err(AppError::BadRequest("Token inválido".into()));
        }

        self.user_repo.enable_two_fa(user.id).await?;
        tracing::info!("2FA ativado para '{}'", user.username);
        Ok(())
    }

    /// Segunda etapa do login: exige o token emitido após a senha.
    pub async fn verify(&self, pre_auth_token: &str, token: &str) -> Result<LoginResponse, AppError> {
        let user_id = self.auth_service.validate_pre_auth_token(pre_auth_token)?;
        let now = Instant::now();
        self.attempts.check(user_id, now)?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !accepts_code(self.otp.as_ref(), &user, token) {
            self.attempts.record_failure(user_id, now);
            tracing::warn!("Código 2FA recusado para '{}'", user.username);
            return Err(AppError::BadRequest("Código inválido".into()));
        }

        self.attempts.clear(user_id);
        self.auth_service.issue_session(user)
    }

    pub async fn disable(&self, user_id: i32) -> Result<(), AppError> {
        if !self.user_repo.disable_two_fa(user_id).await? {
            return Err(AppError::NotFound("Usuário não encontrado.".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Segredo ASCII "12345678901234567890" (vetores do apêndice B da RFC 6238)
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn key() -> Vec<u8> {
        decode_secret(RFC_SECRET).unwrap()
    }

    #[test]
    fn matches_rfc_6238_sha1_vectors() {
        let cases = [
            (59u64, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
        ];
        for (time, expected) in cases {
            assert_eq!(hotp(&key(), time / STEP_SECS).unwrap(), expected, "T={}", time);
        }
    }

    #[test]
    fn accepts_adjacent_steps_only() {
        let totp = TotpAuthenticator::new("InventarioPro");
        // "287082" pertence ao passo 1 (T=30..59)
        assert!(totp.verify_at(RFC_SECRET, "287082", 59));
        assert!(totp.verify_at(RFC_SECRET, "287082", 89));
        assert!(totp.verify_at(RFC_SECRET, "287082", 5));
        assert!(!totp.verify_at(RFC_SECRET, "287082", 120));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let totp = TotpAuthenticator::new("InventarioPro");
        assert!(!totp.verify_at(RFC_SECRET, "28708", 59));
        assert!(!totp.verify_at(RFC_SECRET, "28708a", 59));
        assert!(!totp.verify_at("!!!", "287082", 59));
    }

    #[test]
    fn secret_decoding_is_lenient() {
        let totp = TotpAuthenticator::new("InventarioPro");
        let lower_padded = format!(" {}== ", RFC_SECRET.to_lowercase());
        assert!(totp.verify_at(&lower_padded, "287082", 59));
    }

    #[test]
    fn generated_secret_round_trips() {
        let totp = TotpAuthenticator::new("InventarioPro");
        let secret = totp.generate_secret();
        assert_eq!(decode_secret(&secret).unwrap().len(), SECRET_BYTES);

        let now = 1_700_000_000u64;
        let code = hotp(&decode_secret(&secret).unwrap(), now / STEP_SECS).unwrap();
        assert!(totp.verify_at(&secret, &code, now));
    }

    struct AnyCode;

    impl OtpAuthenticator for AnyCode {
        fn generate_secret(&self) -> String {
            "SEGREDO".into()
        }
        fn provisioning_uri(&self, _account: &str, _secret: &str) -> String {
            String::new()
        }
        fn verify(&self, _secret: &str, _token: &str) -> bool {
            true
        }
    }

    fn user(enabled: bool, secret: Option<&str>) -> User {
        User {
            id: 3,
            username: "maria".into(),
            real_name: "Maria".into(),
            email: "maria@empresa.com".into(),
            password_hash: "$2b$10$hash".into(),
            role: crate::models::auth::UserRole::User,
            last_login: None,
            is_2fa_enabled: enabled,
            two_fa_secret: secret.map(str::to_string),
            sso_provider: None,
            avatar_url: None,
        }
    }

    #[test]
    fn code_is_refused_when_two_factor_is_off() {
        assert!(accepts_code(&AnyCode, &user(true, Some("S")), "123456"));
        // Segredo gerado mas nunca confirmado pelo enable
        assert!(!accepts_code(&AnyCode, &user(false, Some("S")), "123456"));
        assert!(!accepts_code(&AnyCode, &user(true, None), "123456"));
    }

    #[test]
    fn limiter_locks_after_repeated_failures() {
        let limiter = AttemptLimiter::default();
        let start = Instant::now();

        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert!(limiter.check(3, start).is_ok());
            limiter.record_failure(3, start);
        }
        let locked = limiter.check(3, start);
        assert!(matches!(locked, Err(AppError::TooManyAttempts(_))));

        // Outros usuários não são afetados
        assert!(limiter.check(4, start).is_ok());

        // A janela expira
        assert!(limiter.check(3, start + ATTEMPT_WINDOW).is_ok());
    }

    #[test]
    fn success_clears_the_counter() {
        let limiter = AttemptLimiter::default();
        let start = Instant::now();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            limiter.record_failure(3, start);
        }
        limiter.clear(3);
        assert!(limiter.check(3, start).is_ok());
    }

    #[test]
    fn provisioning_uri_escapes_labels() {
        let totp = TotpAuthenticator::new("Inventario Pro");
        let uri = totp.provisioning_uri("joão", "ABC");
        assert_eq!(
            uri,
            "otpauth://totp/Inventario%20Pro:jo%C3%A3o?secret=ABC&issuer=Inventario%20Pro"
        );
    }
}
