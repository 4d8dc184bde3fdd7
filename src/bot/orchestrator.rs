//! Conversation orchestrator.
//!
//! Drives each session through its encode or decode flow:
//!
//! ```text
//! encode: Idle -> AwaitingSecretText -> AwaitingPassword -> (file)  -> Idle
//! decode: Idle -> AwaitingFile       -> AwaitingPassword -> (text)  -> Idle
//! ```
//!
//! Events for one session are handled strictly one at a time (the session
//! lock is held for the whole step, including the cover fetch); events for
//! different sessions interleave freely.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::AppConfig;
use crate::cover::{CoverProvider, FallbackCover, ProceduralCover};
use crate::crypto::KdfParams;
use crate::stego::is_png;

use super::error::PipelineError;
use super::event::{Command, Inbound, InboundKind, Outbound, Reply, SecretText, SessionId, Upload};
use super::pipeline::{open_from_png, seal_into_cover, STEGO_FILE_NAME};
use super::session::{Pending, Session, SessionTable, Stage};

/// Largest upload accepted for decoding.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shortest interval the background sweeper will run at.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

struct Inner {
    config: AppConfig,
    kdf: KdfParams,
    covers: FallbackCover,
    sessions: SessionTable,
}

/// Entry point for the delivery transport. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator around a cover provider.
    ///
    /// The provider is always called under the configured timeout, with
    /// procedural covers as the fallback.
    pub fn new(config: AppConfig, provider: Arc<dyn CoverProvider>) -> Self {
        let covers = FallbackCover::new(provider, config.cover.timeout());
        Self::with_covers(config, covers)
    }

    /// Create an orchestrator that only uses local procedural covers.
    pub fn with_local_covers(config: AppConfig) -> Self {
        Self::new(config, Arc::new(ProceduralCover::new()))
    }

    /// Create an orchestrator with a fully built cover source.
    pub fn with_covers(config: AppConfig, covers: FallbackCover) -> Self {
        let kdf = config.kdf.params();
        Self {
            inner: Arc::new(Inner {
                config,
                kdf,
                covers,
                sessions: SessionTable::new(),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Handle one inbound event and return the replies for its session.
    pub async fn handle(&self, inbound: Inbound) -> Vec<Outbound> {
        let Inbound { session: id, kind } = inbound;
        let slot = self.inner.sessions.get_or_create(id).await;
        let mut session = slot.lock().await;

        let before = session.stage();
        let replies = self.step(&mut session, kind).await;
        let after = session.stage();
        session.touch();

        if before != after {
            debug!(session = %id, from = ?before, to = ?after, "session transition");
        }

        replies
    }

    /// Current stage of a session. Unknown sessions are idle.
    pub async fn stage(&self, id: SessionId) -> Stage {
        match self.inner.sessions.get(id).await {
            Some(slot) => slot.lock().await.stage(),
            None => Stage::Idle,
        }
    }

    /// Number of sessions currently held in memory.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.len().await
    }

    /// Evict sessions idle beyond the configured timeout.
    pub async fn sweep_idle(&self) -> usize {
        let evicted = self
            .inner
            .sessions
            .sweep_idle(self.inner.config.session.idle_timeout())
            .await;
        if evicted > 0 {
            info!(evicted, "evicted idle sessions");
        }
        evicted
    }

    /// Run [`Self::sweep_idle`] periodically until the task is aborted.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let this = self.clone();
        let every = this
            .inner
            .config
            .session
            .sweep_interval()
            .max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                this.sweep_idle().await;
            }
        })
    }

    async fn step(&self, session: &mut Session, kind: InboundKind) -> Vec<Outbound> {
        match kind {
            InboundKind::Command(command) => self.on_command(session, command),
            InboundKind::Text(text) => match session.stage() {
                Stage::Idle => reply(Reply::Help),
                Stage::AwaitingSecretText => self.on_secret_text(session, Zeroizing::new(text)),
                Stage::AwaitingFile => reply(Reply::ExpectedFile),
                Stage::AwaitingEncodePassword | Stage::AwaitingDecodePassword => {
                    self.on_password(session, Zeroizing::new(text)).await
                }
            },
            InboundKind::Document(upload) => match session.stage() {
                Stage::Idle => reply(Reply::Help),
                Stage::AwaitingSecretText => reply(Reply::ExpectedText),
                Stage::AwaitingFile => self.on_upload(session, upload),
                Stage::AwaitingEncodePassword | Stage::AwaitingDecodePassword => {
                    reply(Reply::ExpectedPassword)
                }
            },
            InboundKind::Photo => match session.stage() {
                Stage::Idle => reply(Reply::Help),
                Stage::AwaitingSecretText => reply(Reply::ExpectedText),
                Stage::AwaitingFile => reply(Reply::CompressedPhoto),
                Stage::AwaitingEncodePassword | Stage::AwaitingDecodePassword => {
                    reply(Reply::ExpectedPassword)
                }
            },
            InboundKind::Unsupported => reply(Reply::Unsupported),
        }
    }

    fn on_command(&self, session: &mut Session, command: Command) -> Vec<Outbound> {
        match command {
            Command::Start => {
                session.reset();
                reply(Reply::Help)
            }
            Command::Encode => {
                session.begin_encode();
                reply(Reply::AskSecretText)
            }
            Command::Decode => {
                session.begin_decode();
                reply(Reply::AskFile)
            }
            Command::Cancel => {
                session.reset();
                reply(Reply::Cancelled)
            }
        }
    }

    fn on_secret_text(&self, session: &mut Session, text: Zeroizing<String>) -> Vec<Outbound> {
        let max_chars = self.inner.config.session.max_secret_chars;
        if text.chars().count() > max_chars {
            return reply(Reply::SecretTooLong { max_chars });
        }

        session.store_secret(text);
        reply(Reply::AskEncodePassword)
    }

    fn on_upload(&self, session: &mut Session, upload: Upload) -> Vec<Outbound> {
        let Upload {
            file_name,
            mime_type,
            bytes,
        } = upload;
        let bytes = Zeroizing::new(bytes);

        if bytes.len() > MAX_UPLOAD_BYTES {
            return reply(Reply::UploadTooLarge {
                max_bytes: MAX_UPLOAD_BYTES,
            });
        }

        let declared_png = mime_type.as_deref().map_or(true, |m| m == "image/png");
        if !declared_png || !is_png(&bytes) {
            debug!(session = %session.id(), ?file_name, ?mime_type, "rejected non-PNG upload");
            return reply(Reply::NotPng);
        }

        session.store_stego(bytes);
        reply(Reply::AskDecodePassword)
    }

    async fn on_password(&self, session: &mut Session, password: Zeroizing<String>) -> Vec<Outbound> {
        let id = session.id();
        match session.take_pending() {
            Some(Pending::Secret(text)) => self.run_encode(id, text, password).await,
            Some(Pending::Stego(png)) => self.run_decode(id, png, password).await,
            None => reply(Reply::Help),
        }
    }

    async fn run_encode(
        &self,
        id: SessionId,
        text: Zeroizing<String>,
        password: Zeroizing<String>,
    ) -> Vec<Outbound> {
        let cover_config = &self.inner.config.cover;
        let cover = self
            .inner
            .covers
            .cover_or_fallback(cover_config.width, cover_config.height)
            .await;

        let ttl = self.inner.config.envelope.ttl();
        let kdf = self.inner.kdf.clone();
        let result = tokio::task::spawn_blocking(move || {
            seal_into_cover(&text, &password, ttl, &kdf, &cover)
        })
        .await
        .unwrap_or_else(|e| Err(PipelineError::Internal(e.to_string())));

        match result {
            Ok(png) => {
                info!(session = %id, bytes = png.len(), "secret embedded");
                vec![Outbound::File {
                    file_name: STEGO_FILE_NAME.to_string(),
                    bytes: png,
                    caption: Reply::EncodeDone,
                }]
            }
            Err(e) => {
                warn!(session = %id, error = %e, "encode failed");
                reply(e.reply())
            }
        }
    }

    async fn run_decode(
        &self,
        id: SessionId,
        png: Zeroizing<Vec<u8>>,
        password: Zeroizing<String>,
    ) -> Vec<Outbound> {
        let kdf = self.inner.kdf.clone();
        let result = tokio::task::spawn_blocking(move || open_from_png(&png, &password, &kdf))
            .await
            .unwrap_or_else(|e| Err(PipelineError::Internal(e.to_string())));

        match result {
            Ok(text) => {
                info!(session = %id, "secret recovered");
                reply(Reply::Secret(SecretText(text)))
            }
            Err(e) => {
                info!(session = %id, error = %e, "decode failed");
                reply(e.reply())
            }
        }
    }
}

fn reply(reply: Reply) -> Vec<Outbound> {
    vec![Outbound::Text(reply)]
}
