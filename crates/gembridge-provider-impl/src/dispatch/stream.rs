use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use futures_util::stream::{Stream, unfold};
use futures_util::StreamExt;
use tracing::{debug, warn};

use gembridge_provider_core::ByteStream;
use gembridge_protocol::openai::create_chat_completions::stream::CreateChatCompletionStreamResponse;
use gembridge_protocol::sse::{SseEvent, SseParser, sse_data_bytes};
use gembridge_transform::generate_content::gemini2openai_chat::{is_empty_chunk, transform_chunk};

use super::UpstreamMeta;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StreamStats {
    received: usize,
    forwarded: usize,
    skipped: usize,
    malformed: usize,
}

struct StreamState {
    upstream: ByteStream,
    parser: SseParser,
    pending: VecDeque<Bytes>,
    stats: StreamStats,
    meta: UpstreamMeta,
    trace_id: String,
    finished: bool,
}

impl StreamState {
    fn push_events(&mut self, events: Vec<SseEvent>) {
        for event in events {
            self.stats.received += 1;
            match translate_event(&event.data) {
                Ok(Some(bytes)) => {
                    self.stats.forwarded += 1;
                    self.pending.push_back(bytes);
                }
                Ok(None) => self.stats.skipped += 1,
                Err(err) => {
                    self.stats.malformed += 1;
                    debug!(
                        event = "stream_event_dropped",
                        trace_id = %self.trace_id,
                        provider = %self.meta.provider,
                        error = %err
                    );
                }
            }
        }
    }
}

/// Re-frames an OpenAI chat-completions SSE stream as Gemini
/// `streamGenerateContent` SSE. Each upstream event yields at most one
/// downstream event, in order; unparseable events are dropped.
pub fn gemini_stream_from_openai_chat(
    upstream: ByteStream,
    meta: UpstreamMeta,
    trace_id: String,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    let state = StreamState {
        upstream,
        parser: SseParser::new(),
        pending: VecDeque::new(),
        stats: StreamStats::default(),
        meta,
        trace_id,
        finished: false,
    };
    unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((Ok(item), state));
            }
            if state.finished {
                return None;
            }
            match state.upstream.next().await {
                Some(Ok(bytes)) => {
                    let events = state.parser.push(&bytes);
                    state.push_events(events);
                }
                Some(Err(err)) => {
                    warn!(
                        event = "stream_error",
                        trace_id = %state.trace_id,
                        provider = %state.meta.provider,
                        op = state.meta.operation,
                        error = %err
                    );
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    let events = state.parser.finish();
                    state.push_events(events);
                    state.finished = true;
                    debug!(
                        event = "stream_finished",
                        trace_id = %state.trace_id,
                        provider = %state.meta.provider,
                        op = state.meta.operation,
                        model = %state.meta.model,
                        received = state.stats.received,
                        forwarded = state.stats.forwarded,
                        skipped = state.stats.skipped,
                        malformed = state.stats.malformed
                    );
                }
            }
        }
    })
}

/// `Ok(None)` for events that carry nothing for the client: `[DONE]`, empty
/// data, or chunks that translate to no content.
fn translate_event(data: &str) -> Result<Option<Bytes>, serde_json::Error> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }
    let chunk = serde_json::from_str::<CreateChatCompletionStreamResponse>(data)?;
    let mapped = transform_chunk(chunk);
    if is_empty_chunk(&mapped) {
        return Ok(None);
    }
    let json = serde_json::to_vec(&mapped)?;
    Ok(Some(sse_data_bytes(&json)))
}
