// Async glue between a byte stream from the backend, the session controller
// and a renderer.

use std::cell::RefCell;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::{
    protocols::{SseDecoder, SseEvent, decode_chat_chunk},
    thought_parser::{EmissionState, SessionId, StreamController, StreamError, TransportError},
};

/// Receives emission snapshots for display.
pub trait Renderer {
    fn render(&mut self, state: &EmissionState);
}

impl<F> Renderer for F
where
    F: FnMut(&EmissionState),
{
    fn render(&mut self, state: &EmissionState) {
        self(state)
    }
}

enum Flow {
    Continue,
    Done,
    Stale,
}

/// Drive stream `id` from `source` until `[DONE]`, end of input, or until
/// the stream is superseded.
///
/// One snapshot is rendered per decoded fragment, plus the final snapshot.
/// Malformed fragments are logged and skipped. A transport error cancels the
/// stream and is returned; snapshots already rendered stay rendered.
/// Returns `Ok(None)` when the stream was superseded or cancelled meanwhile.
///
/// The controller is borrowed only between awaits, so another request on
/// the same task may call [`StreamController::begin`] while this one waits.
pub async fn drive_stream<S, R>(
    controller: &RefCell<StreamController>,
    id: SessionId,
    mut source: S,
    renderer: &mut R,
) -> Result<Option<EmissionState>, StreamError>
where
    S: Stream<Item = Result<Bytes, TransportError>> + Unpin,
    R: Renderer + ?Sized,
{
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = source.next().await {
        if !controller.borrow().is_current(id) {
            debug!(%id, "Stream superseded, abandoning source");
            return Ok(None);
        }

        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!(%id, error = %err, "Transport failed, cancelling stream");
                controller.borrow_mut().cancel(id);
                return Err(err.into());
            }
        };

        decoder.push_chunk(&chunk);
        while let Some(event) = decoder.next_event() {
            match apply_event(controller, id, event, renderer)? {
                Flow::Continue => {}
                Flow::Done => return finish(controller, id, renderer),
                Flow::Stale => return Ok(None),
            }
        }
    }

    if decoder.has_remaining() {
        if let Some(event) = decoder.finish() {
            if let Flow::Stale = apply_event(controller, id, event, renderer)? {
                return Ok(None);
            }
        }
    }

    finish(controller, id, renderer)
}

fn apply_event<R>(
    controller: &RefCell<StreamController>,
    id: SessionId,
    event: Result<SseEvent, StreamError>,
    renderer: &mut R,
) -> Result<Flow, StreamError>
where
    R: Renderer + ?Sized,
{
    let payload = match event {
        Ok(SseEvent::Data(payload)) => payload,
        Ok(SseEvent::Done) => return Ok(Flow::Done),
        Err(err) if err.is_recoverable() => {
            warn!(%id, error = %err, "Skipping undecodable line");
            return Ok(Flow::Continue);
        }
        Err(err) => return Err(err),
    };

    let fragment = match decode_chat_chunk(&payload) {
        Ok(Some(fragment)) => fragment,
        Ok(None) => return Ok(Flow::Continue),
        Err(err) => {
            warn!(%id, error = %err, "Skipping malformed fragment");
            return Ok(Flow::Continue);
        }
    };

    let result = controller.borrow_mut().feed(id, &fragment);
    let state = match result {
        Ok(state) => state,
        Err(err) => {
            warn!(%id, error = %err, "Stream failed, cancelling");
            controller.borrow_mut().cancel(id);
            return Err(err);
        }
    };
    match state {
        Some(state) => {
            renderer.render(&state);
            Ok(Flow::Continue)
        }
        None => Ok(Flow::Stale),
    }
}

fn finish<R>(
    controller: &RefCell<StreamController>,
    id: SessionId,
    renderer: &mut R,
) -> Result<Option<EmissionState>, StreamError>
where
    R: Renderer + ?Sized,
{
    let state = controller.borrow_mut().finish(id)?;
    if let Some(state) = &state {
        renderer.render(state);
    }
    Ok(state)
}
