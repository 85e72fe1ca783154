//! Raw IMAP over TLS (rustls) — blocking, run it on the blocking pool.
//!
//! Only the handful of commands the poller needs: LOGIN, SELECT,
//! UID SEARCH, UID FETCH, UID STORE, EXPUNGE, LOGOUT. Literals are read by
//! exact byte count so message bodies survive intact.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use super::email_types::parse_message;
use super::mailbox::{FetchedMessage, MailSession, Mailbox};
use crate::config::AccountConfig;
use crate::error::MailboxError;

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// Trailing `{123}` on a response line announces a literal of 123 bytes.
static LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}\r\n$").expect("valid literal regex"));

/// `* SEARCH 1 2 3` untagged response.
static SEARCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\* SEARCH\b(.*)").expect("valid search regex"));

/// Connects to IMAP servers over implicit TLS.
#[derive(Debug, Clone)]
pub struct ImapMailbox {
    io_timeout: Duration,
}

impl ImapMailbox {
    /// `io_timeout` bounds connect and every socket read/write.
    pub fn new(io_timeout: Duration) -> Self {
        Self { io_timeout }
    }

    fn connect(&self, host: &str, port: u16) -> Result<TlsStream, MailboxError> {
        let conn_err = |reason: String| MailboxError::ConnectionFailed {
            host: host.to_string(),
            reason,
        };

        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| conn_err("no address resolved".into()))?;
        let tcp = TcpStream::connect_timeout(&addr, self.io_timeout)
            .map_err(|e| conn_err(e.to_string()))?;
        tcp.set_read_timeout(Some(self.io_timeout))?;
        tcp.set_write_timeout(Some(self.io_timeout))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder_with_provider(provider)
                .with_safe_default_protocol_versions()
                .map_err(|e| MailboxError::Tls(e.to_string()))?
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name = rustls_pki_types::ServerName::try_from(host.to_string())
            .map_err(|e| MailboxError::Tls(e.to_string()))?;
        let conn = rustls::ClientConnection::new(tls_config, server_name)
            .map_err(|e| MailboxError::Tls(e.to_string()))?;
        Ok(rustls::StreamOwned::new(conn, tcp))
    }
}

impl Mailbox for ImapMailbox {
    fn login(
        &self,
        account: &AccountConfig,
        folder: &str,
    ) -> Result<Box<dyn MailSession>, MailboxError> {
        let stream = self.connect(&account.imap_host, account.imap_port)?;
        let mut session = ImapSession::new(stream);

        let greeting = session.read_line()?;
        if !greeting.starts_with("* OK") && !greeting.starts_with("* PREAUTH") {
            return Err(MailboxError::Protocol(format!(
                "unexpected greeting: {}",
                greeting.trim_end()
            )));
        }

        let login = format!(
            "LOGIN {} {}",
            quote(&account.user),
            quote(account.password.expose_secret())
        );
        let resp = session.command(&login)?;
        if !resp.ok {
            return Err(MailboxError::AuthFailed {
                user: account.user.clone(),
            });
        }

        session.command_ok(&format!("SELECT {}", quote(folder)))?;
        debug!(user = %account.user, folder, "IMAP session opened");
        Ok(Box::new(session))
    }
}

/// Collected response to one tagged command.
#[derive(Debug, Default)]
struct Response {
    lines: Vec<String>,
    literals: Vec<Vec<u8>>,
    ok: bool,
    status_line: String,
}

/// A logged-in, folder-selected IMAP connection.
pub struct ImapSession<S: Read + Write = TlsStream> {
    stream: S,
    next_tag: u32,
    logged_out: bool,
}

impl<S: Read + Write> ImapSession<S> {
    fn new(stream: S) -> Self {
        Self {
            stream,
            next_tag: 1,
            logged_out: false,
        }
    }

    fn read_line(&mut self) -> Result<String, MailboxError> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match self.stream.read(&mut byte) {
                Ok(0) => {
                    return Err(MailboxError::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "IMAP connection closed",
                    )));
                }
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(String::from_utf8_lossy(&buf).to_string());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_literal(&mut self, len: usize) -> Result<Vec<u8>, MailboxError> {
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Send a command and collect everything up to its tagged completion.
    fn command(&mut self, cmd: &str) -> Result<Response, MailboxError> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;

        self.stream.write_all(format!("{tag} {cmd}\r\n").as_bytes())?;
        self.stream.flush()?;

        let mut resp = Response::default();
        let tag_prefix = format!("{tag} ");
        loop {
            let line = self.read_line()?;
            if let Some(status) = line.strip_prefix(&tag_prefix) {
                resp.ok = status.starts_with("OK");
                resp.status_line = line.trim_end().to_string();
                return Ok(resp);
            }
            let literal_len = LITERAL_RE
                .captures(&line)
                .and_then(|c| c[1].parse::<usize>().ok());
            resp.lines.push(line);
            if let Some(len) = literal_len {
                let literal = self.read_literal(len)?;
                resp.literals.push(literal);
            }
        }
    }

    /// Like [`command`](Self::command) but a non-OK completion is an error.
    fn command_ok(&mut self, cmd: &str) -> Result<Response, MailboxError> {
        let resp = self.command(cmd)?;
        if resp.ok {
            Ok(resp)
        } else {
            let verb = cmd.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
            Err(MailboxError::Protocol(format!(
                "{verb} failed: {}",
                resp.status_line
            )))
        }
    }

    fn search_all(&mut self) -> Result<Vec<u32>, MailboxError> {
        let resp = self.command_ok("UID SEARCH ALL")?;
        Ok(parse_search(&resp.lines))
    }
}

impl<S: Read + Write + Send> MailSession for ImapSession<S> {
    fn fetch_recent(
        &mut self,
        limit: usize,
        mark_seen: bool,
    ) -> Result<Vec<FetchedMessage>, MailboxError> {
        let mut uids = self.search_all()?;
        uids.sort_unstable_by(|a, b| b.cmp(a));
        uids.truncate(limit);

        let item = if mark_seen { "RFC822" } else { "BODY.PEEK[]" };
        let mut messages = Vec::with_capacity(uids.len());

        for uid in uids {
            // A NO/BAD completion only concerns this uid. Anything else
            // leaves the stream in an unknown state and aborts the fetch.
            let resp = match self.command_ok(&format!("UID FETCH {uid} (UID {item})")) {
                Ok(resp) => resp,
                Err(e @ MailboxError::Protocol(_)) => {
                    warn!(uid, error = %e, "Server refused message; skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let Some(raw) = resp.literals.into_iter().next() else {
                warn!(uid, "Message has no body; skipping");
                continue;
            };
            match parse_message(uid, &raw) {
                Some(msg) => messages.push(msg),
                None => warn!(uid, "Failed to parse message; skipping"),
            }
        }

        Ok(messages)
    }

    fn delete(&mut self, uid: u32) -> Result<(), MailboxError> {
        self.command_ok(&format!("UID STORE {uid} +FLAGS.SILENT (\\Deleted)"))?;
        self.command_ok("EXPUNGE")?;
        Ok(())
    }

    fn logout(mut self: Box<Self>) -> Result<(), MailboxError> {
        self.logged_out = true;
        self.command("LOGOUT")?;
        Ok(())
    }
}

impl<S: Read + Write> Drop for ImapSession<S> {
    fn drop(&mut self) {
        if !self.logged_out {
            self.logged_out = true;
            if let Err(e) = self.command("LOGOUT") {
                debug!(error = %e, "Best-effort LOGOUT on drop failed");
            }
        }
    }
}

/// Quote a string as an IMAP quoted string.
fn quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Collect UIDs from `* SEARCH` lines.
fn parse_search(lines: &[String]) -> Vec<u32> {
    lines
        .iter()
        .filter_map(|line| SEARCH_RE.captures(line.trim_end()))
        .flat_map(|c| {
            c[1].split_whitespace()
                .filter_map(|n| n.parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}
