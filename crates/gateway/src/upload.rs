//! Streaming byte counter for request bodies.
//!
//! Chunks are pulled one at a time and dropped after their length is
//! recorded, so memory use does not depend on body size.  The count is
//! driven purely by end-of-stream; `Content-Length` is never consulted.

use futures_util::{Stream, StreamExt};

use hs_domain::{Error, Result};

/// Totals observed while draining a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub bytes: u64,
    pub chunks: u64,
}

impl UploadSummary {
    pub fn report(&self) -> String {
        format!("Total bytes received: {}", self.bytes)
    }
}

/// Drain `stream`, summing chunk lengths.
///
/// A transport error aborts the count and is returned as [`Error::Io`];
/// no partial total escapes.
pub async fn count_bytes<S, B, E>(stream: S) -> Result<UploadSummary>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut summary = UploadSummary::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        summary.bytes += chunk.as_ref().len() as u64;
        summary.chunks += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    type Chunk = std::result::Result<Vec<u8>, std::io::Error>;

    #[tokio::test]
    async fn empty_stream_counts_zero() {
        let summary = count_bytes(stream::empty::<Chunk>()).await.unwrap();
        assert_eq!(summary.bytes, 0);
        assert_eq!(summary.report(), "Total bytes received: 0");
    }

    #[tokio::test]
    async fn chunking_does_not_change_total() {
        let chunks: Vec<Chunk> = vec![
            Ok(vec![1; 8192]),
            Ok(Vec::new()),
            Ok(vec![2; 3]),
            Ok(vec![3; 10_000]),
        ];
        let summary = count_bytes(stream::iter(chunks)).await.unwrap();
        assert_eq!(summary.bytes, 8192 + 3 + 10_000);
        assert_eq!(summary.chunks, 4);
    }

    #[tokio::test]
    async fn read_error_yields_no_count() {
        let chunks: Vec<Chunk> = vec![
            Ok(vec![0; 100]),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset")),
            Ok(vec![0; 100]),
        ];
        let err = count_bytes(stream::iter(chunks)).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("peer reset"));
    }
}
