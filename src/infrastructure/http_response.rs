// HTTP response utilities for content-encoded upstream bodies
use async_compression::tokio::bufread::{GzipDecoder, ZlibDecoder};
use bytes::Bytes;
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
}

impl ContentEncoding {
    /// Encodings we can undo; anything else is passed through untouched.
    pub fn from_header(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// Decompress a gzip or deflate (zlib-wrapped) response body.
pub async fn decode_body(body: Bytes, encoding: ContentEncoding) -> Result<Bytes, std::io::Error> {
    let cursor = std::io::Cursor::new(body);
    let mut decoded = Vec::new();
    match encoding {
        ContentEncoding::Gzip => {
            GzipDecoder::new(cursor).read_to_end(&mut decoded).await?;
        }
        ContentEncoding::Deflate => {
            ZlibDecoder::new(cursor).read_to_end(&mut decoded).await?;
        }
    }
    Ok(Bytes::from(decoded))
}

#[cfg(test)]
pub(crate) mod test_encoding {
    use async_compression::tokio::bufread::{GzipEncoder, ZlibEncoder};
    use tokio::io::AsyncReadExt;

    pub async fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzipEncoder::new(std::io::Cursor::new(data.to_vec()));
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await.unwrap();
        compressed
    }

    pub async fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(std::io::Cursor::new(data.to_vec()));
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await.unwrap();
        compressed
    }
}
