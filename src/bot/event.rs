//! Inbound and outbound events exchanged with the delivery transport.

use std::fmt;

/// Conversation identity, e.g. a chat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit user commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show help and reset.
    Start,
    /// Begin hiding a secret.
    Encode,
    /// Begin recovering a secret.
    Decode,
    /// Abandon the current flow.
    Cancel,
}

impl Command {
    /// Parse a slash command such as `/encode`. Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let word = input.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        // Telegram-style "/encode@botname"
        let name = name.split('@').next().unwrap_or(name);

        match name.to_ascii_lowercase().as_str() {
            "start" | "help" => Some(Command::Start),
            "encode" => Some(Command::Encode),
            "decode" => Some(Command::Decode),
            "cancel" => Some(Command::Cancel),
            _ => None,
        }
    }
}

/// A file delivered as a raw document attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original file name, if the transport reports one.
    pub file_name: Option<String>,
    /// MIME type declared by the transport, if any.
    pub mime_type: Option<String>,
    /// File contents, exactly as uploaded.
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: Option<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// A PNG document with the conventional MIME type.
    pub fn png(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(Some(file_name.into()), Some("image/png".to_string()), bytes)
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What arrived from the user.
#[derive(Clone, PartialEq, Eq)]
pub enum InboundKind {
    Command(Command),
    Text(String),
    /// Raw document attachment.
    Document(Upload),
    /// Transport-level photo. Always recompressed, so useless for decoding.
    Photo,
    /// Stickers, voice notes and anything else.
    Unsupported,
}

// Text may be a password, so only its length is shown.
impl fmt::Debug for InboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundKind::Command(command) => f.debug_tuple("Command").field(command).finish(),
            InboundKind::Text(text) => f
                .debug_struct("Text")
                .field("chars", &text.chars().count())
                .finish(),
            InboundKind::Document(upload) => f.debug_tuple("Document").field(upload).finish(),
            InboundKind::Photo => f.write_str("Photo"),
            InboundKind::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// One inbound event tagged with its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub session: SessionId,
    pub kind: InboundKind,
}

impl Inbound {
    pub fn new(session: SessionId, kind: InboundKind) -> Self {
        Self { session, kind }
    }

    /// Classify a text message: slash commands become [`InboundKind::Command`].
    pub fn from_text(session: SessionId, text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = match Command::parse(&text) {
            Some(command) => InboundKind::Command(command),
            None => InboundKind::Text(text),
        };
        Self::new(session, kind)
    }
}

/// Fixed catalogue of user-facing replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Help,
    AskSecretText,
    AskEncodePassword,
    AskFile,
    AskDecodePassword,
    EncodeDone,
    /// The recovered secret.
    Secret(SecretText),
    Expired,
    NoSecretFound,
    Failed,
    CompressedPhoto,
    NotPng,
    UploadTooLarge { max_bytes: usize },
    SecretTooLong { max_chars: usize },
    ExpectedText,
    ExpectedFile,
    ExpectedPassword,
    Unsupported,
    Cancelled,
}

/// Recovered secret text. Redacted in `Debug` output so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretText(pub String);

impl fmt::Debug for SecretText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Help => f.write_str(
                "GenStega hides text inside images.\n\n\
                 /encode - hide a message\n\
                 /decode - read a message\n\
                 /cancel - abandon the current step",
            ),
            Reply::AskSecretText => f.write_str("Enter the text to hide:"),
            Reply::AskEncodePassword => f.write_str("Enter an encryption password:"),
            Reply::AskFile => f.write_str("Send me a PNG image as a file (document), not as a photo."),
            Reply::AskDecodePassword => f.write_str("File received. Enter the password:"),
            Reply::EncodeDone => f.write_str(
                "Done! Send this file to the recipient as a document.\n\
                 The message is hidden inside; only the password opens it.",
            ),
            Reply::Secret(text) => write!(f, "Secret message:\n\n{}", text.0),
            Reply::Expired => f.write_str("This message has expired."),
            Reply::NoSecretFound => {
                f.write_str("Failed to decrypt. Invalid password or no hidden data in the image.")
            }
            Reply::Failed => f.write_str("Something went wrong. Please start again."),
            Reply::CompressedPhoto => f.write_str(
                "You sent a compressed photo. Compression destroys hidden data.\n\
                 Send the image as a file (document) instead.",
            ),
            Reply::NotPng => f.write_str("Not a PNG. Only PNG files can carry hidden messages."),
            Reply::UploadTooLarge { max_bytes } => {
                write!(f, "That file is too large (limit {} KiB).", max_bytes / 1024)
            }
            Reply::SecretTooLong { max_chars } => {
                write!(f, "That text is too long (limit {max_chars} characters). Try a shorter one.")
            }
            Reply::ExpectedText => f.write_str("Please send the secret as a text message."),
            Reply::ExpectedFile => f.write_str("Please send a PNG file, or /cancel."),
            Reply::ExpectedPassword => f.write_str("Please send the password as a text message."),
            Reply::Unsupported => f.write_str("I can't handle that kind of message."),
            Reply::Cancelled => f.write_str("Cancelled."),
        }
    }
}

/// What goes back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(Reply),
    File {
        file_name: String,
        bytes: Vec<u8>,
        caption: Reply,
    },
}

impl Outbound {
    /// The reply carried by this event (caption for files).
    pub fn reply(&self) -> &Reply {
        match self {
            Outbound::Text(reply) => reply,
            Outbound::File { caption, .. } => caption,
        }
    }
}
