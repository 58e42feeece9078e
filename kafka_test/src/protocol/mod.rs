//! Raw wire-protocol probe
//!
//! Sends a hand-encoded ApiVersions v0 request over plain TCP and decodes the
//! advertised API ranges. This bypasses the client library entirely, so it
//! shows what the endpoint really advertises to old clients.

use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::common::TestResult;

pub const API_VERSIONS_KEY: i16 = 18;

/// Largest response frame the probe accepts
const MAX_FRAME_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("truncated {0}")]
    Truncated(&'static str),

    #[error("correlation id mismatch: sent {sent}, received {received}")]
    CorrelationMismatch { sent: i32, received: i32 },

    #[error("invalid frame size {0}")]
    InvalidFrameSize(i32),

    #[error("negative array length {0}")]
    NegativeLength(i32),

    #[error("no bootstrap server in '{0}'")]
    NoBootstrapServer(String),
}

/// One advertised (api_key, min, max) range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiVersionRange {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiVersionsResponse {
    pub error_code: i16,
    pub apis: Vec<ApiVersionRange>,
}

impl ApiVersionsResponse {
    pub fn find(&self, api_key: i16) -> Option<&ApiVersionRange> {
        self.apis.iter().find(|range| range.api_key == api_key)
    }
}

/// Encode a request frame with a v1 request header
pub fn encode_request(
    api_key: i16,
    api_version: i16,
    correlation_id: i32,
    client_id: Option<&str>,
    body: &[u8],
) -> BytesMut {
    let client_id_len = client_id.map_or(0, str::len);
    let size = 2 + 2 + 4 + 2 + client_id_len + body.len();

    let mut buf = BytesMut::with_capacity(4 + size);
    buf.put_i32(size as i32);
    buf.put_i16(api_key);
    buf.put_i16(api_version);
    buf.put_i32(correlation_id);
    match client_id {
        Some(id) => {
            buf.put_i16(id.len() as i16);
            buf.extend_from_slice(id.as_bytes());
        }
        None => buf.put_i16(-1),
    }
    buf.extend_from_slice(body);

    buf
}

/// Split a response frame (without its size prefix) into correlation id and body
pub fn split_response(frame: &[u8]) -> Result<(i32, &[u8]), ProtocolError> {
    if frame.len() < 4 {
        return Err(ProtocolError::Truncated("response header"));
    }
    let mut header = &frame[..4];
    Ok((header.get_i32(), &frame[4..]))
}

/// Decode an ApiVersions v0 response body
pub fn decode_api_versions(mut body: &[u8]) -> Result<ApiVersionsResponse, ProtocolError> {
    if body.remaining() < 2 {
        return Err(ProtocolError::Truncated("error code"));
    }
    let error_code = body.get_i16();

    if body.remaining() < 4 {
        return Err(ProtocolError::Truncated("api array length"));
    }
    let count = body.get_i32();
    if count < 0 {
        return Err(ProtocolError::NegativeLength(count));
    }

    // Each entry is three i16 fields
    if count as usize > body.remaining() / 6 {
        return Err(ProtocolError::Truncated("api version entry"));
    }

    let mut apis = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if body.remaining() < 6 {
            return Err(ProtocolError::Truncated("api version entry"));
        }
        apis.push(ApiVersionRange {
            api_key: body.get_i16(),
            min_version: body.get_i16(),
            max_version: body.get_i16(),
        });
    }

    Ok(ApiVersionsResponse { error_code, apis })
}

async fn read_frame(stream: &mut TcpStream) -> TestResult<Vec<u8>> {
    let size = stream.read_i32().await?;
    if size < 0 || size as usize > MAX_FRAME_SIZE {
        return Err(ProtocolError::InvalidFrameSize(size).into());
    }

    let mut frame = vec![0u8; size as usize];
    stream.read_exact(&mut frame).await?;
    Ok(frame)
}

async fn exchange(address: &str, request: &[u8]) -> TestResult<Vec<u8>> {
    let mut stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;
    stream.write_all(request).await?;
    debug!(address, "Sent ApiVersions v0");
    read_frame(&mut stream).await
}

/// Send ApiVersions v0 to the first bootstrap server and decode the answer
///
/// Plaintext only: TLS and SASL listeners would reject the raw frame.
pub async fn probe_api_versions(
    bootstrap_servers: &str,
    client_id: &str,
    timeout: Duration,
) -> TestResult<ApiVersionsResponse> {
    let address = bootstrap_servers
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .ok_or_else(|| ProtocolError::NoBootstrapServer(bootstrap_servers.to_string()))?;

    let correlation_id = std::process::id() as i32;
    let request = encode_request(API_VERSIONS_KEY, 0, correlation_id, Some(client_id), &[]);

    let frame = tokio::time::timeout(timeout, exchange(address, &request))
        .await
        .map_err(|_| {
            format!(
                "ApiVersions probe to {} timed out after {:?}",
                address, timeout
            )
        })??;

    let (received, body) = split_response(&frame)?;
    if received != correlation_id {
        return Err(ProtocolError::CorrelationMismatch {
            sent: correlation_id,
            received,
        }
        .into());
    }

    Ok(decode_api_versions(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_versions_body(error_code: i16, apis: &[(i16, i16, i16)]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_i16(error_code);
        buf.put_i32(apis.len() as i32);
        for &(key, min, max) in apis {
            buf.put_i16(key);
            buf.put_i16(min);
            buf.put_i16(max);
        }
        buf.to_vec()
    }

    #[test]
    fn test_encode_request_with_client_id() {
        let frame = encode_request(18, 0, 7, Some("probe"), &[]);
        // size + key + version + correlation + string length + "probe"
        assert_eq!(frame.len(), 4 + 2 + 2 + 4 + 2 + 5);

        let mut buf = &frame[..];
        assert_eq!(buf.get_i32() as usize, frame.len() - 4);
        assert_eq!(buf.get_i16(), 18);
        assert_eq!(buf.get_i16(), 0);
        assert_eq!(buf.get_i32(), 7);
        assert_eq!(buf.get_i16(), 5);
        assert_eq!(buf, b"probe");
    }

    #[test]
    fn test_encode_request_null_client_id() {
        let frame = encode_request(18, 0, 1, None, &[]);
        assert_eq!(&frame[frame.len() - 2..], &(-1i16).to_be_bytes());
    }

    #[test]
    fn test_decode_api_versions() {
        let body = api_versions_body(0, &[(0, 0, 9), (1, 0, 13), (18, 0, 3)]);
        let response = decode_api_versions(&body).unwrap();
        assert_eq!(response.error_code, 0);
        assert_eq!(response.apis.len(), 3);
        assert_eq!(
            response.find(18),
            Some(&ApiVersionRange {
                api_key: 18,
                min_version: 0,
                max_version: 3
            })
        );
        assert!(response.find(42).is_none());
    }

    #[test]
    fn test_decode_truncated_entry() {
        let mut body = api_versions_body(0, &[(0, 0, 9)]);
        body.truncate(body.len() - 1);
        assert_eq!(
            decode_api_versions(&body),
            Err(ProtocolError::Truncated("api version entry"))
        );
    }

    #[test]
    fn test_decode_count_beyond_body() {
        let mut body = BytesMut::new();
        body.put_i16(0);
        body.put_i32(i32::MAX);
        assert_eq!(
            decode_api_versions(&body),
            Err(ProtocolError::Truncated("api version entry"))
        );

        // Claims two entries, carries one
        let mut body = api_versions_body(0, &[(18, 0, 3)]);
        body[5] = 2;
        assert_eq!(
            decode_api_versions(&body),
            Err(ProtocolError::Truncated("api version entry"))
        );
    }

    #[test]
    fn test_decode_negative_length() {
        let mut body = BytesMut::new();
        body.put_i16(0);
        body.put_i32(-1);
        assert_eq!(
            decode_api_versions(&body),
            Err(ProtocolError::NegativeLength(-1))
        );
    }

    #[test]
    fn test_split_response() {
        let mut frame = BytesMut::new();
        frame.put_i32(12345);
        frame.put_i16(0);
        let (correlation_id, body) = split_response(&frame).unwrap();
        assert_eq!(correlation_id, 12345);
        assert_eq!(body, &[0, 0]);
        assert!(split_response(&[0, 1]).is_err());
    }
}
