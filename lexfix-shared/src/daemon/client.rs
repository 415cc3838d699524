// SPDX-License-Identifier: GPL-3.0-only
//! Shared daemon client functionality for Lexfix applications

use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::models::protocol::{DaemonRequest, DaemonResponse};
use crate::scoring::{PhraseEvaluation, PronunciationScore, ScoringPolicy};

/// Largest frame either side will accept (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Basic daemon connection utility with improved error handling
async fn connect_to_daemon(socket_path: &Path) -> Result<UnixStream, String> {
    UnixStream::connect(socket_path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused => {
                "Daemon not running. Start the daemon first.".to_string()
            }
            _ => format!("Connection failed: {e}"),
        })
}

/// Write one size-prefixed JSON frame (8-byte big-endian length, then body).
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let data = serde_json::to_vec(message)?;
    let size = data.len() as u64;
    writer.write_all(&size.to_be_bytes()).await?;
    writer.write_all(&data).await?;
    writer.flush().await
}

/// Read one size-prefixed frame body.
///
/// Returns `Ok(None)` when the peer closed the connection before a new frame.
///
/// # Errors
///
/// Returns an error if reading fails or the announced size exceeds
/// [`MAX_FRAME_SIZE`].
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut size_buf = [0u8; 8];
    match reader.read_exact(&mut size_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let size = usize::try_from(u64::from_be_bytes(size_buf))
        .ok()
        .filter(|size| *size <= MAX_FRAME_SIZE)
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Frame too large (max {MAX_FRAME_SIZE} bytes)"),
            )
        })?;

    let mut buf = vec![0u8; size];
    reader.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Send a request to the daemon and read back the JSON response.
///
/// # Errors
///
/// Returns an error when connecting, writing, reading, or parsing fails.
pub async fn send_daemon_request(
    socket_path: &Path,
    request: &DaemonRequest,
) -> Result<DaemonResponse, String> {
    let mut stream = connect_to_daemon(socket_path).await?;

    write_frame(&mut stream, request)
        .await
        .map_err(|e| format!("Failed to write request: {e}"))?;

    let response = read_frame(&mut stream)
        .await
        .map_err(|e| format!("Failed to read response: {e}"))?
        .ok_or_else(|| "Daemon closed the connection without responding".to_string())?;

    serde_json::from_slice(&response).map_err(|e| format!("Failed to parse response: {e}"))
}

/// Create a basic daemon request with client identification
#[must_use]
pub fn create_daemon_request(command: &str, client_id: &str) -> DaemonRequest {
    DaemonRequest {
        command: command.to_string(),
        client_id: Some(client_id.to_string()),
        ..DaemonRequest::default()
    }
}

fn error_message(response: DaemonResponse, fallback: &str) -> String {
    response.message.unwrap_or_else(|| fallback.to_string())
}

/// Ping daemon to check if it's running and responsive
///
/// # Errors
///
/// Returns an error if the ping request cannot be delivered or returns an error status.
pub async fn ping_daemon(socket_path: &Path, client_id: &str) -> Result<String, String> {
    let request = create_daemon_request("ping", client_id);
    let response = send_daemon_request(socket_path, &request).await?;

    if response.is_success() {
        Ok(response
            .message
            .unwrap_or_else(|| "Daemon is running".to_string()))
    } else {
        Err(error_message(response, "Ping failed"))
    }
}

/// Ask the daemon to score one utterance
///
/// # Errors
///
/// Returns an error if the request fails or the daemon responds without a score.
pub async fn request_score(
    socket_path: &Path,
    client_id: &str,
    spoken: &str,
    target: &str,
    confidence: Option<f64>,
) -> Result<PronunciationScore, String> {
    let request = DaemonRequest {
        spoken: Some(spoken.to_string()),
        target: Some(target.to_string()),
        confidence,
        ..create_daemon_request("score", client_id)
    };
    let response = send_daemon_request(socket_path, &request).await?;

    if response.is_success() {
        response
            .score
            .ok_or_else(|| "No score in response".to_string())
    } else {
        Err(error_message(response, "Scoring failed"))
    }
}

/// Ask the daemon for a word-level evaluation of a sentence
///
/// # Errors
///
/// Returns an error if the request fails or the daemon responds without an evaluation.
pub async fn request_evaluation(
    socket_path: &Path,
    client_id: &str,
    spoken: &str,
    expected: &str,
) -> Result<PhraseEvaluation, String> {
    let request = DaemonRequest {
        spoken: Some(spoken.to_string()),
        target: Some(expected.to_string()),
        ..create_daemon_request("evaluate", client_id)
    };
    let response = send_daemon_request(socket_path, &request).await?;

    if response.is_success() {
        response
            .evaluation
            .ok_or_else(|| "No evaluation in response".to_string())
    } else {
        Err(error_message(response, "Evaluation failed"))
    }
}

/// Get the scoring policy the daemon is currently using
///
/// # Errors
///
/// Returns an error if the request fails or the daemon responds without a policy.
pub async fn fetch_scoring_policy(
    socket_path: &Path,
    client_id: &str,
) -> Result<ScoringPolicy, String> {
    let request = create_daemon_request("get_config", client_id);
    let response = send_daemon_request(socket_path, &request).await?;

    if response.is_success() {
        response
            .scoring_policy
            .ok_or_else(|| "No scoring policy in response".to_string())
    } else {
        Err(error_message(response, "Failed to get daemon config"))
    }
}

/// Change the pass threshold on the daemon
///
/// # Errors
///
/// Returns an error if the request fails or the daemon responds with an error.
pub async fn set_pass_threshold(
    socket_path: &Path,
    client_id: &str,
    threshold: u8,
) -> Result<ScoringPolicy, String> {
    let request = DaemonRequest {
        data: Some(serde_json::json!({ "threshold": threshold })),
        ..create_daemon_request("set_pass_threshold", client_id)
    };
    let response = send_daemon_request(socket_path, &request).await?;

    if response.is_success() {
        response
            .scoring_policy
            .ok_or_else(|| "No scoring policy in response".to_string())
    } else {
        Err(error_message(response, "Failed to set pass threshold"))
    }
}

/// Fetch the full daemon status response
///
/// # Errors
///
/// Returns an error if the request fails or the daemon responds with an error.
pub async fn fetch_status(socket_path: &Path, client_id: &str) -> Result<DaemonResponse, String> {
    let request = create_daemon_request("status", client_id);
    let response = send_daemon_request(socket_path, &request).await?;

    if response.is_success() {
        Ok(response)
    } else {
        Err(error_message(response, "Failed to get status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_roundtrip_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let request = create_daemon_request("ping", "test-client");

        write_frame(&mut client, &request).await.unwrap();
        let body = read_frame(&mut server).await.unwrap().unwrap();
        let parsed: DaemonRequest = serde_json::from_slice(&body).unwrap();

        assert_eq!(parsed.command, "ping");
        assert_eq!(parsed.client_id.as_deref(), Some("test-client"));
    }

    #[tokio::test]
    async fn test_read_frame_eof_is_none() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let size = (MAX_FRAME_SIZE as u64 + 1).to_be_bytes();
        client.write_all(&size).await.unwrap();

        let err = read_frame(&mut server).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_missing_daemon_reports_not_running() {
        let path = std::path::PathBuf::from("/tmp/lexfix-test-missing/none.sock");
        let err = ping_daemon(&path, "test-client").await.unwrap_err();
        assert_eq!(err, "Daemon not running. Start the daemon first.");
    }
}
