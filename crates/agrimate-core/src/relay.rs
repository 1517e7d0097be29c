//! Newline-delimited JSON relay
//!
//! Converts the generation service's NDJSON body into an ordered stream of
//! [`StreamDelta`]s. Only the incomplete tail line is ever buffered; each
//! complete line is parsed on its own and a line that fails to parse is
//! logged and dropped without ending the stream.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::generation::ByteStream;
use crate::models::StreamDelta;

/// Ordered text deltas extracted from one generation call.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<StreamDelta>> + Send>>;

/// Byte-level line framing that survives records split across chunks.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and take every line it completes. Blank lines are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut scan_from = self.buffer.len();
        let mut line_start = 0;
        self.buffer.extend_from_slice(chunk);

        while let Some(offset) = self.buffer[scan_from..].iter().position(|b| *b == b'\n') {
            let end = scan_from + offset;
            if let Some(line) = non_blank(&self.buffer[line_start..end]) {
                lines.push(line.to_vec());
            }
            line_start = end + 1;
            scan_from = line_start;
        }

        self.buffer.drain(..line_start);
        lines
    }

    /// Take the unterminated last line once the body has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buffer);
        non_blank(&rest).map(<[u8]>::to_vec)
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn non_blank(line: &[u8]) -> Option<&[u8]> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(line)
    }
}

// Only `response` is typed; the other fields are metadata of any shape.
#[derive(Debug, Deserialize)]
struct GenerateRecord {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    done: Option<Value>,
}

/// Parse one NDJSON record.
///
/// `Ok(None)` for well-formed records that carry no text (status, metadata,
/// the final `done` record, or an upstream `error` object).
pub fn parse_record(line: &[u8]) -> Result<Option<StreamDelta>> {
    let record: GenerateRecord = serde_json::from_slice(line)?;

    if let Some(error) = record.error.filter(|error| !error.is_null()) {
        match error.as_str() {
            Some(message) => {
                tracing::warn!(error = %message, "Generation service reported an error record")
            }
            None => tracing::warn!(error = %error, "Generation service reported an error record"),
        }
    }
    if record.done.as_ref().and_then(Value::as_bool) == Some(true) {
        tracing::debug!("Generation service sent final record");
    }

    Ok(record
        .response
        .filter(|text| !text.is_empty())
        .map(|text| StreamDelta { text }))
}

fn decode_line(line: &[u8]) -> Option<StreamDelta> {
    match parse_record(line) {
        Ok(delta) => delta,
        Err(err) => {
            tracing::warn!(
                error = %err,
                line = %String::from_utf8_lossy(line),
                "Skipping malformed generation record"
            );
            None
        }
    }
}

/// Relay a raw generation body as text deltas in arrival order.
///
/// A transport error from the body ends the stream with that error; the
/// deltas already yielded stand.
pub fn relay_deltas(mut body: ByteStream) -> DeltaStream {
    Box::pin(async_stream::stream! {
        let mut decoder = LineDecoder::new();
        let mut delivered = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::error!(error = %err, delivered, "Generation stream broke mid-body");
                    yield Err(err);
                    return;
                }
            };

            for line in decoder.push(&chunk) {
                if let Some(delta) = decode_line(&line) {
                    delivered += 1;
                    yield Ok(delta);
                }
            }
        }

        if let Some(line) = decoder.finish()
            && let Some(delta) = decode_line(&line)
        {
            delivered += 1;
            yield Ok(delta);
        }

        tracing::debug!(delivered, "Generation stream closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use bytes::Bytes;
    use futures::stream;

    fn body(chunks: Vec<&'static str>) -> ByteStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        ))
    }

    async fn relayed_text(body: ByteStream) -> String {
        relay_deltas(body)
            .map(|delta| delta.unwrap().text)
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[test]
    fn test_line_decoder_holds_partial_line() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"response\":").is_empty());
        assert_eq!(decoder.pending(), 12);

        let lines = decoder.push(b"\"a\"}\n{\"resp");
        assert_eq!(lines, vec![b"{\"response\":\"a\"}".to_vec()]);

        let lines = decoder.push(b"onse\":\"b\"}\r\n\n  \n");
        assert_eq!(lines, vec![b"{\"response\":\"b\"}".to_vec()]);
        assert_eq!(decoder.pending(), 0);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_line_decoder_flushes_unterminated_tail() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"response\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish(), Some(b"{\"response\":\"tail\"}".to_vec()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_parse_record_variants() {
        let delta = parse_record(br#"{"model":"m","response":"Hi","done":false}"#).unwrap();
        assert_eq!(delta, Some(StreamDelta { text: "Hi".to_string() }));

        assert_eq!(parse_record(br#"{"response":""}"#).unwrap(), None);
        assert_eq!(parse_record(br#"{"done":true,"total_duration":12}"#).unwrap(), None);
        assert_eq!(parse_record(br#"{"error":"model not found"}"#).unwrap(), None);

        assert!(matches!(
            parse_record(b"{not json"),
            Err(GatewayError::Json(_))
        ));
        assert!(parse_record(b"42").is_err());
        assert!(parse_record(br#"{"response":7}"#).is_err());
    }

    #[test]
    fn test_parse_record_ignores_odd_metadata_types() {
        let delta = parse_record(br#"{"response":"A","done":null}"#).unwrap();
        assert_eq!(delta, Some(StreamDelta { text: "A".to_string() }));

        let delta = parse_record(br#"{"response":"B","error":{"code":1}}"#).unwrap();
        assert_eq!(delta, Some(StreamDelta { text: "B".to_string() }));

        let delta = parse_record(br#"{"response":"C","done":"yes","error":null}"#).unwrap();
        assert_eq!(delta, Some(StreamDelta { text: "C".to_string() }));
    }

    #[tokio::test]
    async fn test_records_with_unusual_metadata_are_relayed() {
        let text = relayed_text(body(vec![
            "{\"response\":\"A\",\"done\":null}\n",
            "{\"response\":\"B\",\"error\":{\"code\":1}}\n",
            "{\"response\":\"C\"}\n",
        ]))
        .await;

        assert_eq!(text, "ABC");
    }

    #[tokio::test]
    async fn test_relay_concatenates_response_fields_in_order() {
        let text = relayed_text(body(vec![
            "{\"response\":\"The \"}\n{\"response\":\"soil\"}\n",
            "{\"status\":\"loading\"}\n{\"response\":\" is \"}\n",
            "{\"response\":\"dry.\"}\n{\"done\":true}\n",
        ]))
        .await;

        assert_eq!(text, "The soil is dry.");
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped_and_stream_continues() {
        let text = relayed_text(body(vec![
            "{\"response\":\"a\"}\n",
            "{\"response\": oops}\n",
            "{\"response\":\"b\"}\n",
        ]))
        .await;

        assert_eq!(text, "ab");
    }

    #[tokio::test]
    async fn test_record_split_across_chunks() {
        let text = relayed_text(body(vec![
            "{\"respo",
            "nse\":\"whe",
            "at\"}\n{\"response\":\" rust\"}",
        ]))
        .await;

        assert_eq!(text, "wheat rust");
    }

    #[tokio::test]
    async fn test_multibyte_text_split_across_chunks() {
        let line = "{\"response\":\"₹1800/qtl\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xE2).unwrap() + 1;
        let (head, tail) = line.split_at(split);
        let body: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::copy_from_slice(head)),
            Ok(Bytes::copy_from_slice(tail)),
        ]));

        assert_eq!(relayed_text(body).await, "₹1800/qtl");
    }

    #[tokio::test]
    async fn test_no_valid_records_yields_empty_stream() {
        assert_eq!(relayed_text(body(vec![])).await, "");
        assert_eq!(
            relayed_text(body(vec!["garbage\n", "{\"done\":true}\n"])).await,
            ""
        );
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream_after_delivered_deltas() {
        let body: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"{\"response\":\"partial\"}\n")),
            Err(GatewayError::Stream("connection reset".to_string())),
            Ok(Bytes::from_static(b"{\"response\":\"lost\"}\n")),
        ]));

        let items: Vec<_> = relay_deltas(body).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "partial");
        assert!(items[1].is_err());
    }
}
