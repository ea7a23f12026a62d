use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    client::GenerationClient,
    error::{Result, GENERATION_FALLBACK_MESSAGE},
    logger,
    models::{CampaignResult, GenerationRequest, ImageAsset, StylePreset},
    store::ResultStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image selected.
    Idle,
    /// Image selected, nothing submitted yet.
    Staged,
    /// Generate call in flight.
    Generating,
    /// Campaign available in the result store.
    Ready,
    /// Last attempt failed; the image is still staged.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing to submit, or a request is already outstanding.
    Ignored,
    Ready,
    Failed,
    /// The response arrived after the session had moved on and was dropped.
    Stale,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    image: Option<ImageAsset>,
    style: StylePreset,
    creative_brief: Option<String>,
    error: Option<String>,
    token: u64,
}

impl Default for SessionInner {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            image: None,
            style: StylePreset::default(),
            creative_brief: None,
            error: None,
            token: 0,
        }
    }
}

fn lock(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lifecycle of one campaign: image selection, generation and its outcome.
///
/// The session is the only caller of the [`GenerationClient`]. Clones share
/// state, so presentation code can hold a handle while a submit is awaiting.
pub struct CampaignSession<G: ?Sized> {
    inner: Arc<Mutex<SessionInner>>,
    generator: Arc<G>,
    store: ResultStore,
}

impl<G: ?Sized> Clone for CampaignSession<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            generator: Arc::clone(&self.generator),
            store: self.store.clone(),
        }
    }
}

impl<G: GenerationClient + ?Sized> CampaignSession<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self::with_store(generator, ResultStore::new())
    }

    pub fn with_store(generator: Arc<G>, store: ResultStore) -> Self {
        store.clear();
        Self {
            inner: Arc::new(Mutex::new(SessionInner::default())),
            generator,
            store,
        }
    }

    /// Handle onto the store this session seeds.
    pub fn store(&self) -> ResultStore {
        self.store.clone()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.inner).error.clone()
    }

    pub fn image(&self) -> Option<ImageAsset> {
        lock(&self.inner).image.clone()
    }

    pub fn style(&self) -> StylePreset {
        lock(&self.inner).style
    }

    pub fn creative_brief(&self) -> Option<String> {
        lock(&self.inner).creative_brief.clone()
    }

    /// The campaign, once the session is `Ready`.
    pub fn result(&self) -> Option<CampaignResult> {
        let inner = lock(&self.inner);
        if inner.state == SessionState::Ready {
            self.store.snapshot()
        } else {
            None
        }
    }

    /// Stages `image`, replacing any previous image and dropping any previous
    /// result or error. Refused while a generation is in flight.
    pub fn select_image(&self, image: ImageAsset) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state == SessionState::Generating {
            log::debug!("select-image ignored while generating");
            return false;
        }

        log::debug!(
            "staged {} image ({} bytes), was {:?}",
            image.media_type(),
            image.len(),
            inner.state
        );
        inner.image = Some(image);
        inner.error = None;
        inner.token += 1;
        inner.state = SessionState::Staged;
        self.store.clear();
        true
    }

    pub fn clear_image(&self) -> bool {
        let mut inner = lock(&self.inner);
        match inner.state {
            SessionState::Staged | SessionState::Ready | SessionState::Failed => {
                self.discard(&mut inner);
                log::debug!("image cleared");
                true
            }
            state => {
                log::debug!("clear-image ignored while {:?}", state);
                false
            }
        }
    }

    /// Discards image, result and error together.
    pub fn reset(&self) -> bool {
        let mut inner = lock(&self.inner);
        match inner.state {
            SessionState::Ready | SessionState::Failed => {
                self.discard(&mut inner);
                log::debug!("session reset");
                true
            }
            state => {
                log::debug!("reset ignored while {:?}", state);
                false
            }
        }
    }

    pub fn set_style(&self, style: StylePreset) {
        lock(&self.inner).style = style;
    }

    /// Sets the free-text brief sent with the next submit. Blank briefs are dropped.
    pub fn set_creative_brief(&self, brief: Option<String>) {
        lock(&self.inner).creative_brief = brief.filter(|text| !text.trim().is_empty());
    }

    fn discard(&self, inner: &mut SessionInner) {
        inner.image = None;
        inner.error = None;
        inner.token += 1;
        inner.state = SessionState::Idle;
        self.store.clear();
    }

    /// Runs one generation. Only the first call has any effect while a
    /// request is outstanding; later calls return [`SubmitOutcome::Ignored`]
    /// without reaching the service.
    pub async fn submit(&self) -> SubmitOutcome {
        let (token, request) = match self.begin_generation() {
            Some(pending) => pending,
            None => return SubmitOutcome::Ignored,
        };
        let image = request.image.clone();

        let mut pending = PendingGeneration {
            inner: &self.inner,
            token,
            settled: false,
        };
        let outcome = {
            let _timer = logger::timer("campaign generation");
            self.generator.generate(request).await
        };
        pending.settled = true;

        self.complete_generation(token, image, outcome)
    }

    fn begin_generation(&self) -> Option<(u64, GenerationRequest)> {
        let mut inner = lock(&self.inner);
        match inner.state {
            SessionState::Staged | SessionState::Failed => {}
            state => {
                log::debug!("submit ignored while {:?}", state);
                return None;
            }
        }
        let image = inner.image.clone()?;

        inner.token += 1;
        inner.state = SessionState::Generating;
        inner.error = None;
        log::info!(
            "generating campaign (style: {}, brief: {})",
            inner.style,
            if inner.creative_brief.is_some() { "yes" } else { "no" }
        );

        Some((
            inner.token,
            GenerationRequest {
                image,
                style: inner.style,
                creative_brief: inner.creative_brief.clone(),
            },
        ))
    }

    fn complete_generation(
        &self,
        token: u64,
        submitted: ImageAsset,
        outcome: Result<CampaignResult>,
    ) -> SubmitOutcome {
        let mut inner = lock(&self.inner);
        if inner.token != token || inner.state != SessionState::Generating {
            log::debug!(
                "dropping stale generation response (token {}, current {}, state {:?})",
                token,
                inner.token,
                inner.state
            );
            return SubmitOutcome::Stale;
        }

        match outcome {
            Ok(mut result) => {
                result.original_image = submitted.encoded();
                if result.styled_image.is_none() {
                    log::warn!("campaign generated without a styled image");
                }
                log::info!("campaign ready: {}", result.product_analysis.name);
                self.store.seed(result);
                inner.state = SessionState::Ready;
                SubmitOutcome::Ready
            }
            Err(err) => {
                log::error!("campaign generation failed: {}", err);
                inner.error = Some(err.user_message(GENERATION_FALLBACK_MESSAGE));
                inner.state = SessionState::Failed;
                SubmitOutcome::Failed
            }
        }
    }
}

/// Returns the session to `Staged` if a submit future is dropped mid-flight.
struct PendingGeneration<'a> {
    inner: &'a Mutex<SessionInner>,
    token: u64,
    settled: bool,
}

impl Drop for PendingGeneration<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.token == self.token && inner.state == SessionState::Generating {
            log::warn!("generation abandoned before a response arrived");
            inner.state = SessionState::Staged;
        }
    }
}
