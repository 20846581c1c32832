#[cfg(test)]
use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use reqwest::Response;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The underlying byte stream failed mid-read.
    Transport,
    /// The stream delivered something that is not a well-formed event.
    InvalidPayload,
}

/// Where the raw response bytes come from.
pub enum ByteSource {
    Http(Response),
    #[cfg(test)]
    Scripted(VecDeque<Bytes>),
}

impl ByteSource {
    pub fn from_response(response: Response) -> Self {
        ByteSource::Http(response)
    }

    #[cfg(test)]
    pub fn from_chunks(chunks: VecDeque<Bytes>) -> Self {
        ByteSource::Scripted(chunks)
    }

    #[inline]
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            ByteSource::Http(response) => {
                response.chunk().await.map_err(|_| Error::Transport)
            }
            #[cfg(test)]
            ByteSource::Scripted(chunks) => Ok(chunks.pop_front()),
        }
    }
}

/// A reader for server-sent events arriving over a chunked byte stream.
///
/// Events may be split across chunk boundaries (even in the middle of a
/// multi-byte character), so incoming bytes are buffered raw until a
/// complete event is available.
pub struct Sse {
    buf: BytesMut,
    source: ByteSource,
}

impl Sse {
    #[inline]
    pub fn new(source: ByteSource) -> Self {
        Self {
            buf: BytesMut::new(),
            source,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Read more data from the stream first.
            let mut has_more_data = false;
            if let Some(bytes) = self.source.next_chunk().await? {
                self.buf.extend_from_slice(&bytes);
                has_more_data = true;
            }

            // There are data in the buffer, try to parse an event. If the
            // data is not enough to parse an event, we need to read more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            // Abort if no more data available.
            if !has_more_data {
                return Ok(None);
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        // For `end-of-line`, we only handle line feed. And only `data`
        // fields are expected from the completions endpoint.
        //
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / cr / lf )
        let Some(eol_idx) =
            self.buf.windows(2).position(|sep| sep == b"\n\n")
        else {
            return Ok(None);
        };

        // Consume the event (and its separator) from the buffer. Only a
        // complete event is decoded, so a chunk boundary inside a
        // multi-byte character never looks like invalid data.
        let event = self.buf.split_to(eol_idx + 2);
        let Ok(field) = str::from_utf8(&event[..eol_idx]) else {
            return Err(Error::InvalidPayload);
        };
        let Some(data) = field.strip_prefix("data:") else {
            return Err(Error::InvalidPayload);
        };
        let data = data.strip_prefix(' ').unwrap_or(data).to_owned();

        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_normal_events() {
        let source = ByteSource::from_chunks(
            vec![
                Bytes::from_static(b"data: hello\n\n"),
                Bytes::from_static(b"data: bye\n\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "bye");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let source = ByteSource::from_chunks(
            vec![
                Bytes::from_static(b"data:"),
                Bytes::from_static(b" hello\n"),
                Bytes::from_static(b"\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "hello");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        // "café" with the chunk boundary between the two bytes of 'é'.
        let source = ByteSource::from_chunks(
            vec![
                Bytes::from_static(b"data: caf\xc3"),
                Bytes::from_static(b"\xa9\n\n"),
            ]
            .into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "café");
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_done_sentinel_is_plain_data() {
        let source = ByteSource::from_chunks(
            vec![Bytes::from_static(b"data: [DONE]\n\n")].into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap().unwrap(), "[DONE]");
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let source = ByteSource::from_chunks(
            vec![Bytes::from_static(b"xxxxxx\n\n")].into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        // A complete event that is not valid UTF-8 is rejected.
        let source = ByteSource::from_chunks(
            vec![Bytes::from_static(b"data: \xff\xfe\n\n")].into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        // An incomplete event is not an error, just not ready yet.
        let source = ByteSource::from_chunks(
            vec![Bytes::from_static(b"data: hello\n")].into(),
        );
        let mut sse = Sse::new(source);
        assert_eq!(sse.next_event().await.unwrap(), None);
    }
}
