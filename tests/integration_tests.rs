//! Integration tests for GenStega
//!
//! Note: every failure to recover a secret (wrong password, tampered image,
//! image without payload) must look the same to the user. Only expiry and
//! internal failures get their own reply.
//!
//! Covered:
//! - Sealing and hiding round trips, including unicode and empty secrets
//! - Expiry and wrong-password opacity
//! - Capacity limits and lossy re-encoding
//! - Bot sessions: isolation, interleaving, cover fallback

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};

use genstega::bot::{SecretText, Stage, STEGO_FILE_NAME};
use genstega::config::{AppConfig, KdfConfig};
use genstega::cover::{CoverError, CoverProvider, FallbackCover, ProceduralCover};
use genstega::crypto::{derive_key, EnvelopeError, KdfParams};
use genstega::stego::{self, StegoError};
use genstega::{
    open_from_png, seal_into_cover, Inbound, InboundKind, Orchestrator, Outbound, PipelineError,
    Reply, SessionId, Upload,
};

const HOUR: Duration = Duration::from_secs(3600);

fn fast_params() -> KdfParams {
    KdfParams::new(b"integration-salt".to_vec(), 1_000)
}

fn fast_config() -> AppConfig {
    AppConfig {
        kdf: KdfConfig {
            salt: "integration-salt".to_string(),
            iterations: 1_000,
        },
        ..AppConfig::default()
    }
}

fn cover(size: u32) -> RgbImage {
    ProceduralCover::seeded([7u8; 32]).generate(size, size)
}

fn text(id: i64, s: &str) -> Inbound {
    Inbound::from_text(SessionId(id), s)
}

fn png_upload(id: i64, bytes: Vec<u8>) -> Inbound {
    Inbound::new(
        SessionId(id),
        InboundKind::Document(Upload::png(STEGO_FILE_NAME, bytes)),
    )
}

fn only_reply(out: &[Outbound]) -> &Reply {
    assert_eq!(out.len(), 1, "expected exactly one reply, got {out:?}");
    out[0].reply()
}

fn secret(s: &str) -> Reply {
    Reply::Secret(SecretText(s.to_string()))
}

fn expect_file(out: Vec<Outbound>) -> Vec<u8> {
    match out.into_iter().next() {
        Some(Outbound::File { bytes, .. }) => bytes,
        other => panic!("expected a file, got {other:?}"),
    }
}

/// Drive one session through the whole encode flow.
async fn bot_encode(bot: &Orchestrator, id: i64, secret: &str, password: &str) -> Vec<u8> {
    bot.handle(text(id, "/encode")).await;
    bot.handle(text(id, secret)).await;
    expect_file(bot.handle(text(id, password)).await)
}

/// Drive one session through the whole decode flow.
async fn bot_decode(bot: &Orchestrator, id: i64, png: Vec<u8>, password: &str) -> Reply {
    bot.handle(text(id, "/decode")).await;
    bot.handle(png_upload(id, png)).await;
    only_reply(&bot.handle(text(id, password)).await).clone()
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_seal_and_open_roundtrip() {
    let params = fast_params();
    let secrets = [
        "meet at noon",
        "",
        "first paragraph\n\nsecond paragraph\n\n  indented third",
        "Привет, мир! 秘密 🔐",
    ];

    for secret in secrets {
        let png = seal_into_cover(secret, "pw", HOUR, &params, &cover(128)).unwrap();
        assert!(stego::is_png(&png));
        assert_eq!(open_from_png(&png, "pw", &params).unwrap(), secret);
    }
}

#[test]
fn test_wrong_password_is_indistinguishable_from_no_payload() {
    let params = fast_params();
    let png = seal_into_cover("the secret", "right", HOUR, &params, &cover(128)).unwrap();

    let wrong = open_from_png(&png, "wrong", &params).unwrap_err();
    assert!(matches!(
        wrong,
        PipelineError::Envelope(EnvelopeError::DecryptionFailed)
    ));

    let blank = stego::encode_png(&RgbImage::from_pixel(64, 64, image::Rgb([255, 255, 255])))
        .unwrap();
    let empty = open_from_png(&blank, "right", &params).unwrap_err();

    assert_eq!(wrong.reply(), Reply::NoSecretFound);
    assert_eq!(empty.reply(), Reply::NoSecretFound);
    assert_eq!(wrong.reply().to_string(), empty.reply().to_string());
}

#[test]
fn test_zero_ttl_is_expired() {
    let params = fast_params();
    let png = seal_into_cover("gone", "pw", Duration::ZERO, &params, &cover(128)).unwrap();

    let err = open_from_png(&png, "pw", &params).unwrap_err();
    assert!(matches!(err, PipelineError::Envelope(EnvelopeError::Expired)));
    assert_eq!(err.reply(), Reply::Expired);
}

#[test]
fn test_expired_with_wrong_password_reveals_nothing() {
    let params = fast_params();
    let png = seal_into_cover("gone", "pw", Duration::ZERO, &params, &cover(128)).unwrap();

    let err = open_from_png(&png, "not-pw", &params).unwrap_err();
    assert_eq!(err.reply(), Reply::NoSecretFound);
}

#[test]
fn test_cover_too_small_for_secret() {
    let params = fast_params();
    let err = seal_into_cover(&"x".repeat(200), "pw", HOUR, &params, &cover(8)).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Stego(StegoError::CapacityExceeded { .. })
    ));
    assert_eq!(err.reply(), Reply::Failed);
}

#[test]
fn test_fresh_cover_has_no_secret() {
    let params = fast_params();
    let png = stego::encode_png(&cover(128)).unwrap();

    let err = open_from_png(&png, "pw", &params).unwrap_err();
    assert_eq!(err.reply(), Reply::NoSecretFound);
}

#[test]
fn test_saturated_image_is_malformed() {
    let white = RgbImage::from_pixel(32, 32, image::Rgb([255, 255, 255]));
    assert_eq!(stego::extract(&white), Err(StegoError::Malformed));
}

#[test]
fn test_png_reencode_preserves_secret() {
    let params = fast_params();
    let png = seal_into_cover("survives", "pw", HOUR, &params, &cover(128)).unwrap();

    // Decode and write again as PNG: pixels are untouched.
    let reencoded = stego::encode_png(&stego::decode_png(&png).unwrap()).unwrap();
    assert_eq!(open_from_png(&reencoded, "pw", &params).unwrap(), "survives");
}

#[test]
fn test_jpeg_recompression_destroys_secret() {
    let params = fast_params();
    let png = seal_into_cover("fragile", "pw", HOUR, &params, &cover(128)).unwrap();
    let stego_image = stego::decode_png(&png).unwrap();

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(stego_image)
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    let degraded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
    let degraded_png = stego::encode_png(&degraded).unwrap();

    let err = open_from_png(&degraded_png, "pw", &params).unwrap_err();
    assert_eq!(err.reply(), Reply::NoSecretFound);
}

#[test]
fn test_key_derivation_is_deterministic() {
    let params = fast_params();
    assert_eq!(*derive_key("pw", &params), *derive_key("pw", &params));
    assert_ne!(*derive_key("pw", &params), *derive_key("pw2", &params));

    // Same password, different salt: sealed data does not open.
    let png = seal_into_cover("salted", "pw", HOUR, &params, &cover(128)).unwrap();
    let other = KdfParams::new(b"other-salt".to_vec(), 1_000);
    assert!(open_from_png(&png, "pw", &other).is_err());
}

#[test]
fn test_default_config_fits_longest_secret() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    let params = fast_params();
    let longest = "ж".repeat(config.session.max_secret_chars);
    let cover = ProceduralCover::new().generate(config.cover.width, config.cover.height);
    let png = seal_into_cover(&longest, "pw", HOUR, &params, &cover).unwrap();

    assert_eq!(open_from_png(&png, "pw", &params).unwrap(), longest);
}

// ============================================================================
// Bot
// ============================================================================

#[tokio::test]
async fn test_bot_encode_then_decode_in_other_session() {
    let bot = Orchestrator::with_local_covers(fast_config());

    let png = bot_encode(&bot, 10, "line one\nline two", "pw").await;
    assert_eq!(bot.stage(SessionId(10)).await, Stage::Idle);

    let reply = bot_decode(&bot, 20, png, "pw").await;
    assert_eq!(reply, secret("line one\nline two"));
    assert_eq!(bot.stage(SessionId(20)).await, Stage::Idle);
}

#[tokio::test]
async fn test_bot_wrong_password_and_expiry() {
    let mut config = fast_config();
    let bot = Orchestrator::with_local_covers(config.clone());
    let png = bot_encode(&bot, 1, "secret", "pw").await;
    assert_eq!(bot_decode(&bot, 2, png, "nope").await, Reply::NoSecretFound);

    config.envelope.ttl_minutes = 0;
    let bot = Orchestrator::with_local_covers(config);
    let png = bot_encode(&bot, 1, "secret", "pw").await;
    assert_eq!(bot_decode(&bot, 2, png, "pw").await, Reply::Expired);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let bot = Orchestrator::with_local_covers(fast_config());
    let png = bot_encode(&bot, 99, "for B", "b-pass").await;

    // A waits for an encode password, B for a decode password.
    bot.handle(text(1, "/encode")).await;
    bot.handle(text(1, "for A")).await;
    bot.handle(text(2, "/decode")).await;
    bot.handle(png_upload(2, png)).await;

    assert_eq!(bot.stage(SessionId(1)).await, Stage::AwaitingEncodePassword);
    assert_eq!(bot.stage(SessionId(2)).await, Stage::AwaitingDecodePassword);

    let out = bot.handle(text(2, "b-pass")).await;
    assert_eq!(only_reply(&out), &secret("for B"));
    assert_eq!(bot.stage(SessionId(1)).await, Stage::AwaitingEncodePassword);

    let a_png = expect_file(bot.handle(text(1, "a-pass")).await);
    assert_eq!(bot_decode(&bot, 3, a_png, "a-pass").await, secret("for A"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_interleave() {
    let bot = Orchestrator::with_local_covers(fast_config());

    let mut handles = Vec::new();
    for id in 0..8i64 {
        let bot = bot.clone();
        handles.push(tokio::spawn(async move {
            let secret = format!("secret number {id}");
            let password = format!("pw-{id}");
            let png = bot_encode(&bot, id, &secret, &password).await;
            let reply = bot_decode(&bot, id + 100, png, &password).await;
            (secret, reply)
        }));
    }

    for handle in handles {
        let (secret, reply) = handle.await.unwrap();
        assert_eq!(reply, Reply::Secret(SecretText(secret)));
    }
    assert_eq!(bot.session_count().await, 16);
}

#[tokio::test]
async fn test_cancel_drops_buffered_upload() {
    let bot = Orchestrator::with_local_covers(fast_config());
    let png = bot_encode(&bot, 1, "secret", "pw").await;

    bot.handle(text(2, "/decode")).await;
    bot.handle(png_upload(2, png)).await;
    bot.handle(text(2, "/cancel")).await;

    // The password now lands in an idle session and is not treated as one.
    let out = bot.handle(text(2, "pw")).await;
    assert_eq!(only_reply(&out), &Reply::Help);
}

// ============================================================================
// Cover fallback
// ============================================================================

struct StalledProvider;

#[async_trait]
impl CoverProvider for StalledProvider {
    async fn cover(&self, _width: u32, _height: u32) -> Result<RgbImage, CoverError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(CoverError::Unavailable("never answers".to_string()))
    }
}

struct DownProvider;

#[async_trait]
impl CoverProvider for DownProvider {
    async fn cover(&self, _width: u32, _height: u32) -> Result<RgbImage, CoverError> {
        Err(CoverError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_stalled_cover_provider_falls_back() {
    let config = fast_config();
    let covers = FallbackCover::new(Arc::new(StalledProvider), Duration::from_millis(50));
    let bot = Orchestrator::with_covers(config.clone(), covers);

    let png = bot_encode(&bot, 1, "still works", "pw").await;
    let image = stego::decode_png(&png).unwrap();
    assert_eq!(image.dimensions(), (config.cover.width, config.cover.height));

    assert_eq!(bot_decode(&bot, 2, png, "pw").await, secret("still works"));
}

#[tokio::test]
async fn test_failing_cover_provider_falls_back() {
    let bot = Orchestrator::new(fast_config(), Arc::new(DownProvider));
    let png = bot_encode(&bot, 1, "fallback", "pw").await;

    assert_eq!(bot_decode(&bot, 2, png, "pw").await, secret("fallback"));
}
