//! Tor control port client for identity rotation
//!
//! A rotation asks `PROTOCOLINFO` for the accepted authentication methods,
//! authenticates with a password, the auth cookie or nothing at all, then
//! sends `SIGNAL NEWNYM`. Every reply must end in a `250` status line.

use crate::config::ControlConfig;
use crate::{Result, RippleError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Upper bound for a whole control exchange
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Requests a new exit identity
#[async_trait]
pub trait IdentityRotator: Send + Sync {
    async fn rotate(&self) -> Result<()>;
}

/// Talks to a Tor control port over TCP
#[derive(Debug, Clone)]
pub struct TorControl {
    address: String,
    password: Option<String>,
}

impl TorControl {
    pub fn new(address: impl Into<String>, password: Option<String>) -> Self {
        Self {
            address: address.into(),
            password,
        }
    }

    pub fn from_config(config: &ControlConfig) -> Self {
        Self::new(config.address(), config.password.clone())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn exchange(&self) -> Result<()> {
        let stream = TcpStream::connect(&self.address).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let reply =
            send_command(&mut writer, &mut reader, "PROTOCOLINFO 1\r\n", "PROTOCOLINFO").await?;
        let info = ProtocolInfo::parse(&reply);
        let credential = Credential::choose(&info, self.password.as_deref())?;
        tracing::debug!("Authenticating to {} with {}", self.address, credential.name());

        let command = credential.authenticate_command().await?;
        send_command(&mut writer, &mut reader, &command, "AUTHENTICATE").await?;
        send_command(&mut writer, &mut reader, "SIGNAL NEWNYM\r\n", "SIGNAL NEWNYM").await?;

        // Best effort; the circuit is already requested
        let _ = writer.write_all(b"QUIT\r\n").await;
        Ok(())
    }
}

#[async_trait]
impl IdentityRotator for TorControl {
    async fn rotate(&self) -> Result<()> {
        tracing::debug!("Requesting new identity from {}", self.address);

        match tokio::time::timeout(EXCHANGE_TIMEOUT, self.exchange()).await {
            Ok(result) => result,
            Err(_) => Err(RippleError::Control(format!(
                "no answer from {} within {:?}",
                self.address, EXCHANGE_TIMEOUT
            ))),
        }
    }
}

/// Authentication details advertised in a `PROTOCOLINFO` reply
#[derive(Debug, Default, PartialEq, Eq)]
struct ProtocolInfo {
    methods: Vec<String>,
    cookie_file: Option<PathBuf>,
}

impl ProtocolInfo {
    /// Reads the `AUTH` line out of the reply lines
    fn parse(lines: &[String]) -> Self {
        let mut info = Self::default();

        for line in lines {
            let body = line.get(4..).unwrap_or("");
            let auth = match body.strip_prefix("AUTH ") {
                Some(auth) => auth,
                None => continue,
            };

            for token in auth.split_whitespace() {
                if let Some(methods) = token.strip_prefix("METHODS=") {
                    info.methods = methods.split(',').map(|m| m.to_ascii_uppercase()).collect();
                }
            }

            if let Some(start) = auth.find("COOKIEFILE=\"") {
                let quoted = &auth[start + "COOKIEFILE=\"".len()..];
                info.cookie_file = Some(PathBuf::from(unquote(quoted)));
            }
        }

        info
    }

    fn offers(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// Reads a control-protocol quoted string up to its closing quote
fn unquote(quoted: &str) -> String {
    let mut out = String::new();
    let mut chars = quoted.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            other => out.push(other),
        }
    }

    out
}

/// Escapes a value for a control-protocol quoted string
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// How to answer `AUTHENTICATE`
#[derive(Debug, PartialEq, Eq)]
enum Credential {
    Null,
    Password(String),
    Cookie(PathBuf),
}

impl Credential {
    /// A configured password always wins; otherwise null auth, then the cookie
    fn choose(info: &ProtocolInfo, password: Option<&str>) -> Result<Self> {
        if let Some(password) = password {
            return Ok(Self::Password(password.to_string()));
        }

        if info.methods.is_empty() || info.offers("NULL") {
            return Ok(Self::Null);
        }

        if info.offers("COOKIE") {
            if let Some(path) = &info.cookie_file {
                return Ok(Self::Cookie(path.clone()));
            }
        }

        Err(RippleError::Control(format!(
            "control port accepts {} but no password is configured",
            info.methods.join(",")
        )))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Null => "no credentials",
            Self::Password(_) => "password",
            Self::Cookie(_) => "auth cookie",
        }
    }

    async fn authenticate_command(&self) -> Result<String> {
        match self {
            Self::Null => Ok("AUTHENTICATE\r\n".to_string()),
            Self::Password(password) => Ok(format!("AUTHENTICATE {}\r\n", quote(password))),
            Self::Cookie(path) => {
                let cookie = tokio::fs::read(path).await.map_err(|e| {
                    RippleError::Control(format!("cannot read {}: {}", path.display(), e))
                })?;
                Ok(format!("AUTHENTICATE {}\r\n", hex::encode(cookie)))
            }
        }
    }
}

/// Writes one command and returns its reply lines, which must end in `250`
async fn send_command<W, R>(
    writer: &mut W,
    reader: &mut R,
    command: &str,
    name: &str,
) -> Result<Vec<String>>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    writer.write_all(command.as_bytes()).await?;
    writer.flush().await?;

    let reply = read_reply(reader, name).await?;
    match reply.last() {
        Some(last) if last.starts_with("250") => Ok(reply),
        Some(last) => Err(RippleError::Control(format!("{} rejected: {}", name, last))),
        None => Err(RippleError::Control(format!("empty {} reply", name))),
    }
}

/// Reads `NNN-` continuation lines up to the closing `NNN ` line
async fn read_reply<R>(reader: &mut R, name: &str) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(RippleError::Control(format!(
                "connection closed while waiting for {} reply",
                name
            )));
        }

        let line = line.trim_end().to_string();
        let done = line.as_bytes().get(3) != Some(&b'-');
        lines.push(line);
        if done {
            return Ok(lines);
        }
    }
}
