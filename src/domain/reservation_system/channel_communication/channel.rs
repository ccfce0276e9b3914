use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::BytesMut;
use nix::errno::Errno;
use nix::sys::stat::Mode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe::{OpenOptions, Receiver, Sender};
use tokio_util::codec::{Decoder, Encoder};
use uuid::Uuid;

use crate::domain::reservation_system::channel_communication::codec::RecordCodec;
use crate::domain::reservation_system::channel_communication::protocol::{ControllerResponse, WireRecord};
use crate::domain::reservation_system::config::RetryPolicy;
use crate::error::{Error, Result};

/// A named FIFO owned by this process; the file is removed when the value is dropped.
#[derive(Debug)]
pub struct NamedChannel {
    path: PathBuf,
}

impl NamedChannel {
    /// Creates the FIFO at `path`, replacing a stale file left by an earlier run.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        match std::fs::remove_file(&path) {
            Ok(()) => log::warn!("Removed stale channel file '{}'.", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        match nix::unistd::mkfifo(&path, Mode::from_bits_truncate(0o666)) {
            Ok(()) | Err(Errno::EEXIST) => {}
            Err(source) => return Err(Error::ChannelCreationError { path, source }),
        }

        log::debug!("Created channel '{}'.", path.display());
        Ok(NamedChannel { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NamedChannel {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed channel '{}'.", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove channel '{}': {}", self.path.display(), e),
        }
    }
}

/// Result of reading one record from a channel.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    Record(T),
    /// Every writer has closed its end.
    EndOfStream,
    /// Fewer bytes than one record arrived in a single read.
    Short(usize),
    /// A full record arrived but did not decode.
    Malformed(String),
}

/// Opens the read end without waiting for a writer.
pub fn accept(path: &Path) -> Result<Receiver> {
    let receiver = OpenOptions::new().open_receiver(path)?;
    log::debug!("Listening on channel '{}'.", path.display());
    Ok(receiver)
}

/// Replaces `current` by a fresh read end of the same FIFO.
///
/// The new end is opened before the old one is closed, so the FIFO keeps a
/// reader at every instant and no writer can observe a missing reader.
pub fn reopen(path: &Path, current: &mut Receiver) -> Result<()> {
    let fresh = accept(path)?;
    let stale = std::mem::replace(current, fresh);
    drop(stale);
    Ok(())
}

fn is_transient(e: &io::Error) -> bool {
    e.raw_os_error() == Some(Errno::ENXIO as i32) || e.kind() == io::ErrorKind::NotFound
}

/// Opens the write end, retrying while the FIFO has no reader or does not exist yet.
pub async fn connect_with_retry(path: &Path, retry: RetryPolicy) -> Result<Sender> {
    for attempt in 1..=retry.attempts {
        match OpenOptions::new().open_sender(path) {
            Ok(sender) => return Ok(sender),
            Err(e) if is_transient(&e) => {
                log::debug!("Channel '{}' not ready (attempt {}/{}): {}", path.display(), attempt, retry.attempts, e);
                if attempt < retry.attempts {
                    tokio::time::sleep(retry.backoff).await;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::ChannelUnavailable { path: path.to_path_buf(), attempts: retry.attempts })
}

/// Encodes `record` into one fixed-size frame.
pub fn encode_record<T: WireRecord>(path: &Path, record: T) -> Result<BytesMut> {
    let mut frame = BytesMut::with_capacity(T::RECORD_SIZE);
    RecordCodec::<T>::new()
        .encode(record, &mut frame)
        .map_err(|e| Error::MalformedRecord { path: path.to_path_buf(), reason: e.to_string() })?;
    Ok(frame)
}

/// Writes `record` as a single write of one full frame.
pub async fn send_record<T: WireRecord>(sender: &mut Sender, path: &Path, record: T) -> Result<()> {
    let frame = encode_record(path, record)?;
    sender.write_all(&frame).await?;
    Ok(())
}

/// Reads at most one record.
///
/// A read returning fewer bytes than a record is reported as [`ReadOutcome::Short`];
/// the bytes are discarded, never joined with a later read.
pub async fn read_record<T: WireRecord>(receiver: &mut Receiver) -> io::Result<ReadOutcome<T>> {
    let mut buffer = vec![0u8; T::RECORD_SIZE];
    let n = receiver.read(&mut buffer).await?;

    if n == 0 {
        return Ok(ReadOutcome::EndOfStream);
    }
    if n < T::RECORD_SIZE {
        return Ok(ReadOutcome::Short(n));
    }

    let mut frame = BytesMut::from(&buffer[..]);
    match RecordCodec::<T>::new().decode(&mut frame) {
        Ok(Some(record)) => Ok(ReadOutcome::Record(record)),
        Ok(None) => Ok(ReadOutcome::Short(n)),
        Err(e) => Ok(ReadOutcome::Malformed(e.to_string())),
    }
}

/// Unique response channel path for one agent process.
pub fn response_channel_path(dir: &Path, agent_id: &str) -> PathBuf {
    let safe_id: String = agent_id.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect();
    let suffix = Uuid::new_v4().simple().to_string();
    dir.join(format!("pipe_{}_{}_{}", safe_id, std::process::id(), &suffix[..8]))
}

/// The agent's private channel for controller replies.
#[derive(Debug)]
pub struct ResponseChannel {
    channel: NamedChannel,
}

impl ResponseChannel {
    pub fn create(dir: &Path, agent_id: &str) -> Result<Self> {
        let channel = NamedChannel::create(response_channel_path(dir, agent_id))?;
        Ok(ResponseChannel { channel })
    }

    pub fn path(&self) -> &Path {
        self.channel.path()
    }

    /// Opens the read end for one exchange.
    ///
    /// Must be called before the request is sent, so the controller finds a
    /// reader as soon as it answers.
    pub fn listen(&self) -> Result<PendingResponse> {
        let receiver = accept(self.path())?;
        Ok(PendingResponse { path: self.path().to_path_buf(), receiver })
    }
}

/// Read end of one request/response exchange. Closed after the single record is read.
#[derive(Debug)]
pub struct PendingResponse {
    path: PathBuf,
    receiver: Receiver,
}

impl PendingResponse {
    pub async fn receive(mut self, timeout: Duration) -> Result<ControllerResponse> {
        let outcome = tokio::time::timeout(timeout, read_record::<ControllerResponse>(&mut self.receiver))
            .await
            .map_err(|_| Error::ResponseTimeout { path: self.path.clone(), seconds: timeout.as_secs() })??;

        match outcome {
            ReadOutcome::Record(response) => Ok(response),
            ReadOutcome::EndOfStream => Err(Error::UnexpectedResponse(format!("'{}' closed without a response", self.path.display()))),
            ReadOutcome::Short(n) => Err(Error::MalformedRecord { path: self.path, reason: format!("short record of {} bytes", n) }),
            ReadOutcome::Malformed(reason) => Err(Error::MalformedRecord { path: self.path, reason }),
        }
    }
}

/// Controller side of one exchange: open, write one record, close.
///
/// Every step is bounded, so a vanished or stuck agent costs at most
/// `retry` plus `write_timeout`.
pub async fn respond(path: &Path, response: ControllerResponse, retry: RetryPolicy, write_timeout: Duration) -> Result<()> {
    let mut sender = connect_with_retry(path, retry).await?;

    tokio::time::timeout(write_timeout, send_record(&mut sender, path, response))
        .await
        .map_err(|_| Error::ResponseTimeout { path: path.to_path_buf(), seconds: write_timeout.as_secs() })?
}
