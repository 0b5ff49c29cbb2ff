// One live translation stream per popup, guarded by generation ids so that
// late fragments from a superseded request never reach the renderer.

use tracing::debug;

use crate::{
    config::{ConfigResult, StreamConfig},
    thought_parser::{
        session::StreamSession,
        traits::{EmissionState, Fragment, SessionId, StreamError},
    },
};

#[derive(Debug, Clone)]
pub struct StreamController {
    session: StreamSession,
    generation: u64,
    live: Option<SessionId>,
}

impl StreamController {
    pub fn new(config: &StreamConfig) -> ConfigResult<Self> {
        Ok(Self::with_session(StreamSession::from_config(config)?))
    }

    pub fn with_session(session: StreamSession) -> Self {
        Self {
            session,
            generation: 0,
            live: None,
        }
    }

    /// Start a new stream, cancelling the one in flight if any.
    pub fn begin(&mut self) -> SessionId {
        if let Some(previous) = self.live.take() {
            debug!(%previous, "Superseding in-flight stream");
            self.session.cancel();
        }

        self.generation += 1;
        let id = SessionId(self.generation);
        self.session.start();
        self.live = Some(id);
        debug!(%id, "Stream started");
        id
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.live == Some(id)
    }

    /// Id of the stream currently accepting fragments.
    pub fn live_session(&self) -> Option<SessionId> {
        self.live
    }

    /// Feed a fragment to the stream `id`.
    ///
    /// Returns `Ok(None)` when `id` has been superseded, cancelled or ended;
    /// the fragment is dropped without touching the live stream.
    pub fn feed(
        &mut self,
        id: SessionId,
        fragment: &Fragment,
    ) -> Result<Option<EmissionState>, StreamError> {
        if !self.is_current(id) {
            debug!(%id, "Ignoring fragment for stale stream");
            return Ok(None);
        }
        self.session.feed(fragment).map(Some)
    }

    /// End the stream `id` and return its final state.
    pub fn finish(&mut self, id: SessionId) -> Result<Option<EmissionState>, StreamError> {
        if !self.is_current(id) {
            debug!(%id, "Ignoring end of stale stream");
            return Ok(None);
        }
        self.live = None;
        let state = self.session.end()?;
        debug!(%id, %state, "Stream finished");
        Ok(Some(state))
    }

    /// Cancel the stream `id`. Returns false if it was not live.
    pub fn cancel(&mut self, id: SessionId) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.live = None;
        self.session.cancel();
        debug!(%id, "Stream cancelled");
        true
    }

    /// Current state of the live stream, if one is running.
    pub fn snapshot(&self) -> Option<EmissionState> {
        self.live.and_then(|_| self.session.snapshot())
    }
}
