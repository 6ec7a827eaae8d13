use std::sync::Arc;
use std::time::Instant;

use answer_oracle::AnswerOracle;
use dialog_driver::{ControlId, DialogDriver, SelectorIntent, WaitCondition};
use easyapply_core_types::JobId;
use form_fill::{DialogFillEngine, FillMode, TriedAnswers};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn, Span};

use crate::errors::{FlowError, FlowResult};
use crate::policy::FlowPolicy;
use crate::state::{AbandonReason, ApplyOutcome, DialogState};

/// Summary of one job for reports.
#[derive(Clone, Debug, Serialize)]
pub struct JobReport {
    pub id: JobId,
    pub url: String,
    pub outcome: ApplyOutcome,
    pub steps: u32,
    pub fill_passes: u32,
    pub history: Vec<DialogState>,
    pub elapsed_ms: u64,
}

enum StepResult {
    /// Still on an open dialog; keep going.
    Continue,
    Done(ApplyOutcome),
}

/// Drives one application dialog from the apply trigger to a terminal state.
///
/// Owns the tried-answers cache, which is reset whenever a dialog opens or closes.
pub struct SubmissionMachine {
    driver: Arc<dyn DialogDriver>,
    engine: DialogFillEngine,
    policy: FlowPolicy,
    tried: TriedAnswers,
    state: DialogState,
    history: Vec<DialogState>,
    fill_passes: u32,
}

impl SubmissionMachine {
    pub fn new(
        driver: Arc<dyn DialogDriver>,
        oracle: Arc<dyn AnswerOracle>,
        policy: FlowPolicy,
    ) -> Self {
        Self {
            engine: DialogFillEngine::new(Arc::clone(&driver), oracle),
            driver,
            policy,
            tried: TriedAnswers::new(),
            state: DialogState::NoDialog,
            history: vec![DialogState::NoDialog],
            fill_passes: 0,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn history(&self) -> &[DialogState] {
        &self.history
    }

    pub fn tried(&self) -> &TriedAnswers {
        &self.tried
    }

    pub fn policy(&self) -> &FlowPolicy {
        &self.policy
    }

    fn reset(&mut self) {
        self.tried.clear();
        self.state = DialogState::NoDialog;
        self.history = vec![DialogState::NoDialog];
        self.fill_passes = 0;
    }

    fn transition(&mut self, next: DialogState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "dialog state");
            self.state = next;
            self.history.push(next);
        }
    }

    /// Navigates to `url` and runs the whole attempt. Never fails; every problem ends
    /// up in the returned outcome.
    #[instrument(skip_all, fields(job = %url, id = tracing::field::Empty))]
    pub async fn apply_to_job(&mut self, url: &str) -> JobReport {
        let started = Instant::now();
        let id = JobId::new();
        Span::current().record("id", id.to_string().as_str());
        self.reset();

        let (outcome, steps) = match self.driver.navigate(url).await {
            Err(err) => {
                warn!(error = %err, "navigation failed");
                (ApplyOutcome::NavigationFailed(err.to_string()), 0)
            }
            Ok(()) => match self.open_dialog().await {
                Err(err) => {
                    info!(reason = %err, "no application dialog");
                    (ApplyOutcome::NoDialog, 0)
                }
                Ok(()) => self.drive().await,
            },
        };

        // Cache never outlives the dialog.
        self.tried.clear();
        info!(outcome = %outcome, steps, fill_passes = self.fill_passes, "job finished");
        JobReport {
            id,
            url: url.to_string(),
            outcome,
            steps,
            fill_passes: self.fill_passes,
            history: self.history.clone(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Waits for the apply trigger, clicks it and waits for the dialog.
    pub async fn open_dialog(&mut self) -> FlowResult<()> {
        self.driver
            .wait_until(
                WaitCondition::Present(SelectorIntent::ApplyButton),
                self.policy.apply_wait(),
            )
            .await?;
        let apply = self.actionable(SelectorIntent::ApplyButton).await?;
        self.driver.click(&apply).await?;
        self.driver
            .wait_until(
                WaitCondition::Present(SelectorIntent::Dialog),
                self.policy.dialog_wait(),
            )
            .await
            .map_err(|_| FlowError::DialogNotOpened)?;
        self.tried.clear();
        self.transition(DialogState::AwaitingFill);
        Ok(())
    }

    /// Runs the fill/advance/submit cycle on an open dialog. Returns the outcome and the
    /// number of outer iterations used.
    pub async fn drive(&mut self) -> (ApplyOutcome, u32) {
        for step in 1..=self.policy.step_limit {
            self.settle().await;
            if !self.dialog_open().await {
                return (self.abandon(AbandonReason::DialogClosed).await, step);
            }

            let submit = self.actionable(SelectorIntent::SubmitButton).await.ok();
            let advance = match submit {
                Some(_) => None,
                None => self.actionable(SelectorIntent::AdvanceButtons).await.ok(),
            };
            let result = match (submit, advance) {
                (Some(submit), _) => self.submit_step(submit).await,
                (None, Some(advance)) => self.advance_step(advance).await,
                (None, None) => StepResult::Done(self.abandon(AbandonReason::Blocked).await),
            };

            match result {
                StepResult::Continue => self.transition(DialogState::AwaitingFill),
                StepResult::Done(outcome) => return (outcome, step),
            }
        }
        warn!(limit = self.policy.step_limit, "step limit reached");
        let outcome = self.abandon(AbandonReason::StepLimit).await;
        (outcome, self.policy.step_limit)
    }

    #[instrument(skip_all)]
    async fn submit_step(&mut self, submit: ControlId) -> StepResult {
        self.transition(DialogState::Submitting);
        if let Err(err) = self.driver.click(&submit).await {
            debug!(error = %err, "submit click failed");
        }
        if self.closed_after_click().await {
            return StepResult::Done(self.submitted());
        }

        for attempt in 1..=self.policy.repair_attempts {
            if self.engine.pending_mode().await == Some(FillMode::ErrorRepair) {
                info!(attempt, "repairing errors before resubmitting");
                self.fill(FillMode::ErrorRepair).await;
                self.settle().await;
            } else {
                debug!(attempt, "no errors shown; resubmitting");
            }
            match self.actionable(SelectorIntent::SubmitButton).await {
                Ok(submit) => {
                    if let Err(err) = self.driver.click(&submit).await {
                        debug!(attempt, error = %err, "submit click failed");
                    }
                }
                Err(err) => debug!(attempt, error = %err, "submit unavailable"),
            }
            if self.closed_after_click().await {
                return StepResult::Done(self.submitted());
            }
        }

        warn!(attempts = self.policy.repair_attempts, "dialog still open after submit retries");
        StepResult::Done(self.abandon(AbandonReason::SubmitRetriesExhausted).await)
    }

    /// Clicks advance, then repairs the step being left until it moves on. Repairs only
    /// count while the dialog still shows that same step.
    #[instrument(skip_all)]
    async fn advance_step(&mut self, advance: ControlId) -> StepResult {
        self.transition(DialogState::Advancing);
        let leaving = self.step_signature().await;
        if let Err(err) = self.driver.click(&advance).await {
            warn!(error = %err, "advance click failed");
            return StepResult::Done(self.abandon(AbandonReason::Blocked).await);
        }
        sleep(self.policy.post_click_delay()).await;

        for attempt in 1..=self.policy.repair_attempts {
            if !self.dialog_open().await || self.moved_on(&leaving).await {
                return StepResult::Continue;
            }
            let Some(mode) = self.engine.pending_mode().await else {
                return StepResult::Continue;
            };
            info!(attempt, mode = %mode, "fields pending after advance");
            self.fill(mode).await;
            self.settle().await;
            match self.actionable(SelectorIntent::AdvanceButtons).await {
                Ok(advance) => {
                    if let Err(err) = self.driver.click(&advance).await {
                        debug!(attempt, error = %err, "advance click failed");
                    }
                    sleep(self.policy.post_click_delay()).await;
                }
                // The step moved on to a submit or review screen.
                Err(_) => return StepResult::Continue,
            }
        }

        if self.dialog_open().await
            && !self.moved_on(&leaving).await
            && self.engine.pending_mode().await.is_some()
        {
            warn!(attempts = self.policy.repair_attempts, "fields still pending after advance retries");
            return StepResult::Done(self.abandon(AbandonReason::AdvanceRetriesExhausted).await);
        }
        StepResult::Continue
    }

    async fn fill(&mut self, mode: FillMode) {
        self.fill_passes += 1;
        let report = self.engine.fill_with_mode(mode, &mut self.tried).await;
        debug!(
            mode = %mode,
            queued = report.queued,
            applied = report.applied,
            skipped = report.skipped,
            "fill pass"
        );
    }

    fn submitted(&mut self) -> ApplyOutcome {
        self.tried.clear();
        self.transition(DialogState::Submitted);
        ApplyOutcome::Submitted
    }

    /// Dismisses the dialog when possible and ends the job.
    async fn abandon(&mut self, reason: AbandonReason) -> ApplyOutcome {
        match self.actionable(SelectorIntent::DismissButton).await {
            Ok(dismiss) => {
                if let Err(err) = self.driver.click(&dismiss).await {
                    debug!(error = %err, "dismiss failed");
                }
            }
            Err(err) => debug!(error = %err, "no dismiss affordance"),
        }
        self.tried.clear();
        self.transition(DialogState::Abandoned);
        info!(reason = %reason, "job abandoned");
        ApplyOutcome::Abandoned(reason)
    }

    /// First visible, enabled element for `intent`.
    async fn actionable(&self, intent: SelectorIntent) -> FlowResult<ControlId> {
        for control in self.driver.find_controls(intent).await? {
            match self.driver.describe(&control).await {
                Ok(info) if info.is_actionable() => return Ok(control),
                Ok(_) => continue,
                Err(err) if err.is_transient() => {
                    debug!(control = %control, error = %err, "affordance unreadable")
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(FlowError::AffordanceMissing(intent))
    }

    /// A transient lookup failure counts as still open; the next iteration looks again.
    async fn dialog_open(&self) -> bool {
        match self.driver.find_controls(SelectorIntent::Dialog).await {
            Ok(found) => !found.is_empty(),
            Err(err) if err.is_transient() => {
                debug!(error = %err, "dialog lookup failed; assuming still open");
                true
            }
            Err(err) => {
                warn!(error = %err, "dialog lookup failed");
                false
            }
        }
    }

    /// Label controls of the step on screen; they change when the dialog moves to another step.
    async fn step_signature(&self) -> Option<Vec<ControlId>> {
        self.driver.find_controls(SelectorIntent::Labels).await.ok()
    }

    async fn moved_on(&self, leaving: &Option<Vec<ControlId>>) -> bool {
        match (leaving, self.step_signature().await) {
            (Some(before), Some(now)) => *before != now,
            _ => false,
        }
    }

    async fn closed_after_click(&self) -> bool {
        self.driver
            .wait_until(
                WaitCondition::Absent(SelectorIntent::Dialog),
                self.policy.post_click_delay(),
            )
            .await
            .is_ok()
    }

    async fn settle(&self) {
        let delay = self.policy.settle_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
