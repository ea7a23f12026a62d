use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    client::RefinementClient,
    error::{Result, WorkflowError, REFINEMENT_FALLBACK_MESSAGE},
    models::{CopyField, RefineRequest, RefineResponse},
    store::ResultStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Closed,
    Editing,
    Refining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineOutcome {
    /// No session open, blank instruction, or a round already in flight.
    Ignored,
    /// The draft now holds the refined text.
    Applied,
    /// The draft is unchanged and the session carries a notice.
    Failed,
    /// The session closed before the response arrived; nothing changed.
    Stale,
}

/// Read-only copy of the open refinement session, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementView {
    pub session_id: u64,
    pub field: CopyField,
    pub label: &'static str,
    pub draft: String,
    pub pending_instruction: String,
    pub in_flight: bool,
    pub notice: Option<String>,
    pub rounds: u32,
}

#[derive(Debug)]
struct RefinementSession {
    id: u64,
    field: CopyField,
    draft: String,
    pending_instruction: String,
    in_flight: bool,
    notice: Option<String>,
    rounds: u32,
    store_epoch: u64,
}

impl RefinementSession {
    fn view(&self) -> RefinementView {
        RefinementView {
            session_id: self.id,
            field: self.field,
            label: self.field.label(),
            draft: self.draft.clone(),
            pending_instruction: self.pending_instruction.clone(),
            in_flight: self.in_flight,
            notice: self.notice.clone(),
            rounds: self.rounds,
        }
    }
}

#[derive(Debug, Default)]
struct WorkflowInner {
    session: Option<RefinementSession>,
    next_id: u64,
}

fn lock(inner: &Mutex<WorkflowInner>) -> MutexGuard<'_, WorkflowInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-slot editor over one marketing copy field at a time.
///
/// Refinement rounds only ever touch the draft; the result store changes on
/// [`save`](Self::save) alone. Every session gets a fresh id, and responses
/// are matched against it, so a late answer for a cancelled session is
/// dropped even if the same field was reopened meanwhile.
pub struct RefinementWorkflow<R: ?Sized> {
    inner: Arc<Mutex<WorkflowInner>>,
    refiner: Arc<R>,
    store: ResultStore,
}

impl<R: ?Sized> Clone for RefinementWorkflow<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            refiner: Arc::clone(&self.refiner),
            store: self.store.clone(),
        }
    }
}

impl<R: RefinementClient + ?Sized> RefinementWorkflow<R> {
    pub fn new(refiner: Arc<R>, store: ResultStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkflowInner::default())),
            refiner,
            store,
        }
    }

    pub fn state(&self) -> WorkflowState {
        let mut inner = lock(&self.inner);
        match self.live(&mut inner) {
            None => WorkflowState::Closed,
            Some(session) if session.in_flight => WorkflowState::Refining,
            Some(_) => WorkflowState::Editing,
        }
    }

    pub fn view(&self) -> Option<RefinementView> {
        let mut inner = lock(&self.inner);
        self.live(&mut inner).map(RefinementSession::view)
    }

    /// The open session, closing it first if its campaign has been replaced.
    fn live<'a>(&self, inner: &'a mut WorkflowInner) -> Option<&'a RefinementSession> {
        let current_epoch = self.store.epoch();
        let stale = inner
            .session
            .as_ref()
            .filter(|session| session.store_epoch != current_epoch)
            .map(|session| session.id);
        if let Some(id) = stale {
            log::debug!("closing refinement session {}: campaign was replaced", id);
            inner.session = None;
        }
        inner.session.as_ref()
    }

    /// Opens `field` with a fresh snapshot of its current value.
    pub fn open(&self, field: CopyField) -> std::result::Result<RefinementView, WorkflowError> {
        let mut inner = lock(&self.inner);
        if let Some(open) = &inner.session {
            if open.store_epoch == self.store.epoch() {
                return Err(WorkflowError::AlreadyOpen(open.field));
            }
            log::debug!(
                "discarding refinement session {} left over from a replaced campaign",
                open.id
            );
            inner.session = None;
        }

        let (draft, store_epoch) = self
            .store
            .field_text(field)
            .ok_or(WorkflowError::NoCampaign)?;

        inner.next_id += 1;
        let session = RefinementSession {
            id: inner.next_id,
            field,
            draft,
            pending_instruction: String::new(),
            in_flight: false,
            notice: None,
            rounds: 0,
            store_epoch,
        };
        log::debug!("refinement session {} opened on {}", session.id, field);
        let view = session.view();
        inner.session = Some(session);
        Ok(view)
    }

    fn editable<'a>(
        &self,
        inner: &'a mut WorkflowInner,
    ) -> std::result::Result<&'a mut RefinementSession, WorkflowError> {
        let stale = match &inner.session {
            None => return Err(WorkflowError::NotOpen),
            Some(session) => session.store_epoch != self.store.epoch(),
        };
        if stale {
            inner.session = None;
            return Err(WorkflowError::StaleCampaign);
        }
        match inner.session.as_mut() {
            Some(session) if session.in_flight => Err(WorkflowError::InFlight),
            Some(session) => Ok(session),
            None => Err(WorkflowError::NotOpen),
        }
    }

    pub fn set_instruction(&self, instruction: impl Into<String>) -> std::result::Result<(), WorkflowError> {
        let mut inner = lock(&self.inner);
        let session = self.editable(&mut inner)?;
        session.pending_instruction = instruction.into();
        Ok(())
    }

    /// Replaces the draft by hand, without a refinement round.
    pub fn edit_draft(&self, draft: impl Into<String>) -> std::result::Result<(), WorkflowError> {
        let mut inner = lock(&self.inner);
        let session = self.editable(&mut inner)?;
        session.draft = draft.into();
        session.notice = None;
        Ok(())
    }

    /// Sends the pending instruction against the current draft.
    pub async fn refine(&self) -> RefineOutcome {
        let (session_id, request) = match self.begin_round() {
            Some(round) => round,
            None => return RefineOutcome::Ignored,
        };

        let mut pending = PendingRound {
            inner: &self.inner,
            session_id,
            settled: false,
        };
        let outcome = self.refiner.refine(request).await;
        pending.settled = true;

        self.complete_round(session_id, outcome)
    }

    fn begin_round(&self) -> Option<(u64, RefineRequest)> {
        let mut inner = lock(&self.inner);
        let session = match self.editable(&mut inner) {
            Ok(session) => session,
            Err(reason) => {
                log::debug!("refine ignored: {}", reason);
                return None;
            }
        };

        let instruction = session.pending_instruction.trim();
        if instruction.is_empty() {
            log::debug!("refine ignored: empty instruction");
            return None;
        }

        let request = RefineRequest {
            current_text: session.draft.clone(),
            instruction: instruction.to_string(),
            field: session.field,
        };
        session.in_flight = true;
        session.notice = None;
        log::info!(
            "refining {} (session {}, round {})",
            session.field,
            session.id,
            session.rounds + 1
        );
        Some((session.id, request))
    }

    fn complete_round(&self, session_id: u64, outcome: Result<RefineResponse>) -> RefineOutcome {
        let mut inner = lock(&self.inner);
        let current_epoch = self.store.epoch();

        let session = match inner.session.as_mut() {
            Some(session) if session.id == session_id && session.in_flight => session,
            _ => {
                log::debug!(
                    "dropping stale refinement response for session {}",
                    session_id
                );
                return RefineOutcome::Stale;
            }
        };

        if session.store_epoch != current_epoch {
            log::debug!(
                "dropping refinement response for session {}: campaign was replaced",
                session_id
            );
            inner.session = None;
            return RefineOutcome::Stale;
        }

        session.in_flight = false;
        match outcome {
            Ok(response) => {
                session.draft = response.refined_text;
                session.pending_instruction.clear();
                session.rounds += 1;
                RefineOutcome::Applied
            }
            Err(err) => {
                log::warn!("refinement of {} failed: {}", session.field, err);
                session.notice = Some(err.user_message(REFINEMENT_FALLBACK_MESSAGE));
                RefineOutcome::Failed
            }
        }
    }

    /// Commits the draft into the result store and closes the session. Any
    /// unsent instruction is discarded.
    pub fn save(&self) -> std::result::Result<CopyField, WorkflowError> {
        let mut inner = lock(&self.inner);
        match &inner.session {
            None => return Err(WorkflowError::NotOpen),
            Some(session) if session.in_flight => return Err(WorkflowError::InFlight),
            Some(_) => {}
        }
        let session = inner.session.take().ok_or(WorkflowError::NotOpen)?;

        if self
            .store
            .overwrite_at(session.store_epoch, session.field, &session.draft)
        {
            log::info!(
                "saved {} after {} refinement round(s)",
                session.field,
                session.rounds
            );
            Ok(session.field)
        } else {
            log::warn!(
                "refinement session {} closed without saving: campaign was replaced",
                session.id
            );
            Err(WorkflowError::StaleCampaign)
        }
    }

    /// Closes the session without touching the store. Works mid-flight too;
    /// the outstanding response will be dropped when it lands.
    pub fn cancel(&self) -> bool {
        match lock(&self.inner).session.take() {
            Some(session) => {
                log::debug!(
                    "refinement session {} on {} cancelled{}",
                    session.id,
                    session.field,
                    if session.in_flight { " mid-flight" } else { "" }
                );
                true
            }
            None => false,
        }
    }
}

/// Clears the in-flight flag if a refine future is dropped before its response.
struct PendingRound<'a> {
    inner: &'a Mutex<WorkflowInner>,
    session_id: u64,
    settled: bool,
}

impl Drop for PendingRound<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock(self.inner);
        if let Some(session) = inner.session.as_mut() {
            if session.id == self.session_id && session.in_flight {
                log::warn!("refinement round abandoned before a response arrived");
                session.in_flight = false;
            }
        }
    }
}
