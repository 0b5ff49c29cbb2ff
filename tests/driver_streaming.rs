//! End-to-end streaming tests
//!
//! Drives SSE bodies shaped like an OpenAI-compatible chat completion stream
//! through the driver and checks what the renderer receives.

use std::cell::RefCell;

use bytes::Bytes;
use futures::{channel::mpsc, stream};
use serde_json::json;
use stream_translate::{
    DelimiterPair, EmissionState, StreamController, StreamError, TransportError,
    config::StreamConfigBuilder, drive_stream,
};

/// One SSE event per delta, `(content, reasoning_content)`, then `[DONE]`.
fn sse_body(deltas: &[(Option<&str>, Option<&str>)]) -> String {
    let mut body = String::new();
    body.push_str(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    );
    for (content, reasoning) in deltas {
        let chunk = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "model": "hunyuan-mt",
            "choices": [{
                "index": 0,
                "delta": { "content": content, "reasoning_content": reasoning },
                "finish_reason": null
            }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn content_body(contents: &[&str]) -> String {
    let deltas: Vec<_> = contents.iter().map(|c| (Some(*c), None)).collect();
    sse_body(&deltas)
}

fn byte_chunks(body: &str, size: usize) -> Vec<Result<Bytes, TransportError>> {
    body.as_bytes()
        .chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

fn controller(pair: DelimiterPair) -> RefCell<StreamController> {
    let config = StreamConfigBuilder::new().delimiters(pair).build().unwrap();
    RefCell::new(StreamController::new(&config).unwrap())
}

async fn replay(
    pair: DelimiterPair,
    chunks: Vec<Result<Bytes, TransportError>>,
) -> (Result<Option<EmissionState>, StreamError>, Vec<EmissionState>) {
    let controller = controller(pair);
    let id = controller.borrow_mut().begin();
    let mut rendered = Vec::new();
    let mut renderer = |state: &EmissionState| rendered.push(state.clone());
    let result = drive_stream(&controller, id, stream::iter(chunks), &mut renderer).await;
    (result, rendered)
}

#[tokio::test]
async fn test_drive_prompted_markers() {
    let body = content_body(&["Bon", "jour<<<TH", "OUGHT>>>greeting, informal", "<<<END>>> le monde"]);
    let (result, rendered) = replay(DelimiterPair::bracketed(), byte_chunks(&body, 4096)).await;

    let final_state = result.unwrap().unwrap();
    assert_eq!(final_state.answer_text, "Bonjour le monde");
    assert_eq!(final_state.thought_text, "greeting, informal");
    assert!(final_state.thought_visible);

    // One snapshot per content fragment plus the final one
    assert_eq!(rendered.len(), 5);
    assert_eq!(rendered[0].answer_text, "Bon");
    assert_eq!(rendered[1].answer_text, "Bonjour");
    assert!(!rendered[1].thought_visible);
    assert_eq!(rendered[2].thought_text, "greeting, informal");
    assert!(rendered[2].thought_visible);
    assert_eq!(rendered.last(), Some(&final_state));
}

#[tokio::test]
async fn test_drive_is_independent_of_network_chunking() {
    let body = content_body(&["你好", "<think>", "formal", "</think>", "，世界"]);
    let (expected, _) = replay(DelimiterPair::think_tags(), byte_chunks(&body, body.len())).await;
    let expected = expected.unwrap().unwrap();
    assert_eq!(expected.answer_text, "你好，世界");
    assert_eq!(expected.thought_text, "formal");

    for size in 1..=64 {
        let (result, _) = replay(DelimiterPair::think_tags(), byte_chunks(&body, size)).await;
        assert_eq!(result.unwrap().unwrap(), expected, "chunk size {size}");
    }
}

#[tokio::test]
async fn test_drive_native_reasoning_channel() {
    let body = sse_body(&[
        (None, Some("The user wants ")),
        (None, Some("French.")),
        (Some("Bonjour"), None),
    ]);
    let (result, rendered) = replay(DelimiterPair::bracketed(), byte_chunks(&body, 7)).await;

    let final_state = result.unwrap().unwrap();
    assert_eq!(final_state.thought_text, "The user wants French.");
    assert_eq!(final_state.answer_text, "Bonjour");
    assert!(rendered[0].thought_visible);
    assert_eq!(rendered[0].answer_text, "");
}

#[tokio::test]
async fn test_drive_skips_malformed_fragments() {
    let mut body = String::new();
    body.push_str("data: {\"choices\":[{\"delta\":{\"content\":\"one \"}}]}\n\n");
    body.push_str("data: {not json\n\n");
    body.push_str("data: {\"choices\":[{\"delta\":{\"content\":\"two\"}}]}\n\n");
    body.push_str("data: [DONE]\n\n");

    let mut chunks = byte_chunks(&body, body.len());
    // A line of invalid UTF-8 is skipped as well
    chunks.insert(0, Ok(Bytes::from_static(b"data: \xff\xfe\n\n")));

    let (result, rendered) = replay(DelimiterPair::bracketed(), chunks).await;
    let final_state = result.unwrap().unwrap();
    assert_eq!(final_state.answer_text, "one two");
    assert_eq!(rendered.len(), 3);
}

#[tokio::test]
async fn test_drive_ends_without_done_sentinel() {
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"A<think>B\"}}]}";
    let (result, _) = replay(DelimiterPair::think_tags(), byte_chunks(body, 5)).await;

    let final_state = result.unwrap().unwrap();
    assert_eq!(final_state.answer_text, "A");
    assert_eq!(final_state.thought_text, "B");
    assert!(final_state.thought_visible);
}

#[tokio::test]
async fn test_drive_transport_error_cancels_stream() {
    let body = content_body(&["partial answer"]);
    let cut = body.find("data: [DONE]").unwrap();
    let chunks = vec![
        Ok(Bytes::from(body[..cut].to_string())),
        Err(TransportError::new("connection reset by peer")),
        Ok(Bytes::from_static(b"data: [DONE]\n\n")),
    ];

    let controller = controller(DelimiterPair::bracketed());
    let id = controller.borrow_mut().begin();
    let mut rendered = Vec::new();
    let mut renderer = |state: &EmissionState| rendered.push(state.clone());
    let result = drive_stream(&controller, id, stream::iter(chunks), &mut renderer).await;

    match result {
        Err(StreamError::Transport(err)) => assert_eq!(err.message, "connection reset by peer"),
        other => panic!("Expected transport error, got {other:?}"),
    }
    // Whatever was shown stays shown
    assert_eq!(rendered.last().unwrap().answer_text, "partial answer");
    assert!(!controller.borrow().is_current(id));
    assert_eq!(controller.borrow_mut().finish(id).unwrap(), None);
}

#[tokio::test]
async fn test_superseded_stream_stops_rendering() {
    let controller = controller(DelimiterPair::bracketed());
    let old = controller.borrow_mut().begin();
    let (tx, rx) = mpsc::unbounded::<Result<Bytes, TransportError>>();
    tx.unbounded_send(Ok(Bytes::from(
        "data: {\"choices\":[{\"delta\":{\"content\":\"old \"}}]}\n\n",
    )))
    .unwrap();

    let mut old_rendered = Vec::new();
    let mut old_renderer = |state: &EmissionState| old_rendered.push(state.clone());
    let drive_old = drive_stream(&controller, old, rx, &mut old_renderer);

    let supersede = async {
        tokio::task::yield_now().await;
        let new = controller.borrow_mut().begin();
        tx.unbounded_send(Ok(Bytes::from(
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
        )))
        .unwrap();
        drop(tx);
        new
    };

    let (old_result, new) = futures::join!(drive_old, supersede);
    assert_eq!(old_result.unwrap(), None);
    assert_eq!(old_rendered.len(), 1);
    assert_eq!(old_rendered[0].answer_text, "old ");

    let body = content_body(&["fresh"]);
    let mut new_rendered = Vec::new();
    let mut new_renderer = |state: &EmissionState| new_rendered.push(state.clone());
    let final_state = drive_stream(
        &controller,
        new,
        stream::iter(byte_chunks(&body, 3)),
        &mut new_renderer,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(final_state.answer_text, "fresh");
    assert!(new_rendered.iter().all(|s| !s.answer_text.contains("old")));
}

#[tokio::test]
async fn test_buffer_overflow_is_fatal() {
    let config = StreamConfigBuilder::new().max_buffer_size(32).build().unwrap();
    let controller = RefCell::new(StreamController::new(&config).unwrap());
    let id = controller.borrow_mut().begin();
    let body = content_body(&["<<<THOUGHT>>>", "a very long thought that never closes"]);
    let mut renderer = |_: &EmissionState| {};

    let result = drive_stream(
        &controller,
        id,
        stream::iter(byte_chunks(&body, 16)),
        &mut renderer,
    )
    .await;
    assert!(matches!(result, Err(StreamError::BufferOverflow(_))));
    assert!(controller.borrow().live_session().is_none());
}
