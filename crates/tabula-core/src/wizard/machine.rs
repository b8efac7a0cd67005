//! Generic multi-step wizard.
//!
//! The wizard knows nothing about what it collects: steps carry optional
//! validators over the answers type `A`, and `finish` hands the answers to a
//! caller-supplied completion.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, TabulaError};

/// Decides whether the wizard may leave a step going forward.
#[async_trait]
pub trait StepValidator<A>: Send + Sync {
    /// `Ok(false)` and `Err` both block the transition.
    async fn validate(&self, answers: &A) -> Result<bool>;
}

/// Adapts a plain predicate into a [`StepValidator`].
pub struct PredicateValidator<F>(pub F);

#[async_trait]
impl<A, F> StepValidator<A> for PredicateValidator<F>
where
    A: Sync,
    F: Fn(&A) -> bool + Send + Sync,
{
    async fn validate(&self, answers: &A) -> Result<bool> {
        Ok((self.0)(answers))
    }
}

pub struct WizardStep<A> {
    pub id: &'static str,
    pub title: String,
    validator: Option<Arc<dyn StepValidator<A>>>,
}

impl<A: Sync + 'static> WizardStep<A> {
    pub fn new(id: &'static str, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            validator: None,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn StepValidator<A>>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_check<F>(self, check: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.with_validator(Arc::new(PredicateValidator(check)))
    }

    async fn allows_forward(&self, answers: &A) -> bool {
        match &self.validator {
            None => true,
            Some(validator) => match validator.validate(answers).await {
                Ok(valid) => valid,
                Err(err) => {
                    tracing::debug!("Wizard step '{}' validator rejected: {}", self.id, err);
                    false
                }
            },
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { to: usize },
    /// The current step's validator refused.
    Blocked,
    /// Already at the first (for `previous`) or last (for `next`) step.
    AtBoundary,
}

struct WizardState<A> {
    current_step_index: usize,
    answers: A,
}

/// Clears the busy flag however `finish` exits, including when its future is dropped.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A linear wizard over answers of type `A`.
///
/// Invariant: `current_step_index` stays within `[0, steps.len() - 1]`.
pub struct Wizard<A> {
    steps: Vec<WizardStep<A>>,
    state: RwLock<WizardState<A>>,
    is_submitting: AtomicBool,
}

impl<A> Wizard<A>
where
    A: Clone + Send + Sync + 'static,
{
    /// Opens a wizard at step 0. A wizard without steps is rejected.
    pub fn new(steps: Vec<WizardStep<A>>, answers: A) -> Result<Self> {
        if steps.is_empty() {
            return Err(TabulaError::validation("a wizard needs at least one step"));
        }

        Ok(Self {
            steps,
            state: RwLock::new(WizardState {
                current_step_index: 0,
                answers,
            }),
            is_submitting: AtomicBool::new(false),
        })
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[WizardStep<A>] {
        &self.steps
    }

    pub async fn current_step_index(&self) -> usize {
        self.state.read().await.current_step_index
    }

    pub async fn current_step(&self) -> &WizardStep<A> {
        let index = self.current_step_index().await;
        &self.steps[index]
    }

    pub async fn is_last_step(&self) -> bool {
        self.current_step_index().await == self.steps.len() - 1
    }

    pub async fn answers(&self) -> A {
        self.state.read().await.answers.clone()
    }

    /// Edits the answers in place. Never moves between steps.
    pub async fn update_answers<F>(&self, edit: F)
    where
        F: FnOnce(&mut A),
    {
        let mut state = self.state.write().await;
        edit(&mut state.answers);
    }

    /// True while a `finish` completion is running.
    pub fn is_submitting(&self) -> bool {
        self.is_submitting.load(Ordering::SeqCst)
    }

    /// Whether the current step's validator accepts the current answers.
    pub async fn can_advance(&self) -> bool {
        let (index, answers) = self.snapshot().await;
        self.steps[index].allows_forward(&answers).await
    }

    /// Validates the current step and moves forward on success.
    pub async fn next(&self) -> Navigation {
        if self.is_submitting() {
            return Navigation::Blocked;
        }

        let (index, answers) = self.snapshot().await;
        if index + 1 >= self.steps.len() {
            return Navigation::AtBoundary;
        }

        if !self.steps[index].allows_forward(&answers).await {
            return Navigation::Blocked;
        }

        let mut state = self.state.write().await;
        // Someone navigated while the validator ran; do not apply a stale decision.
        if state.current_step_index != index {
            return Navigation::Blocked;
        }
        state.current_step_index = index + 1;
        Navigation::Moved {
            to: state.current_step_index,
        }
    }

    /// Moves back one step. Never validated.
    pub async fn previous(&self) -> Navigation {
        let mut state = self.state.write().await;
        if state.current_step_index == 0 {
            return Navigation::AtBoundary;
        }
        state.current_step_index -= 1;
        Navigation::Moved {
            to: state.current_step_index,
        }
    }

    /// Validates the last step and runs `complete` with the answers.
    ///
    /// Returns `Ok(None)` when the validator blocks. Fails when not on the last
    /// step, when another `finish` is still running, or when `complete` fails;
    /// in every case the wizard stays on the last step.
    pub async fn finish<F, Fut, T>(&self, complete: F) -> Result<Option<T>>
    where
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (index, answers) = self.snapshot().await;
        if index + 1 != self.steps.len() {
            return Err(TabulaError::transition(
                "finish is only available on the last step",
            ));
        }

        if self
            .is_submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TabulaError::transition("already submitting"));
        }
        let _guard = SubmitGuard(&self.is_submitting);

        if !self.steps[index].allows_forward(&answers).await {
            return Ok(None);
        }

        complete(answers).await.map(Some)
    }

    async fn snapshot(&self) -> (usize, A) {
        let state = self.state.read().await;
        (state.current_step_index, state.answers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Answers {
        name: String,
        agreed: bool,
    }

    fn wizard() -> Wizard<Answers> {
        Wizard::new(
            vec![
                WizardStep::new("name", "Name").with_check(|a: &Answers| !a.name.is_empty()),
                WizardStep::new("details", "Details"),
                WizardStep::new("confirm", "Confirm").with_check(|a: &Answers| a.agreed),
            ],
            Answers::default(),
        )
        .unwrap()
    }

    struct FailingValidator;

    #[async_trait]
    impl StepValidator<Answers> for FailingValidator {
        async fn validate(&self, _answers: &Answers) -> Result<bool> {
            Err(TabulaError::network("validator backend offline"))
        }
    }

    #[tokio::test]
    async fn test_next_blocked_by_validator() {
        let wizard = wizard();
        assert_eq!(wizard.next().await, Navigation::Blocked);
        assert_eq!(wizard.current_step_index().await, 0);

        wizard.update_answers(|a| a.name = "Q3".into()).await;
        assert_eq!(wizard.next().await, Navigation::Moved { to: 1 });
    }

    #[tokio::test]
    async fn test_index_stays_in_range() {
        let wizard = wizard();
        wizard.update_answers(|a| a.name = "Q3".into()).await;

        for _ in 0..10 {
            wizard.next().await;
            let index = wizard.current_step_index().await;
            assert!(index < wizard.step_count());
        }
        assert_eq!(wizard.next().await, Navigation::AtBoundary);

        for _ in 0..10 {
            wizard.previous().await;
        }
        assert_eq!(wizard.current_step_index().await, 0);
        assert_eq!(wizard.previous().await, Navigation::AtBoundary);
    }

    #[tokio::test]
    async fn test_previous_ignores_validation() {
        let wizard = wizard();
        wizard.update_answers(|a| a.name = "Q3".into()).await;
        wizard.next().await;
        wizard.next().await;

        // Invalidate an earlier step; going back is still allowed.
        wizard.update_answers(|a| a.name.clear()).await;
        assert_eq!(wizard.previous().await, Navigation::Moved { to: 1 });
        assert_eq!(wizard.previous().await, Navigation::Moved { to: 0 });
    }

    #[tokio::test]
    async fn test_validator_error_blocks() {
        let wizard = Wizard::new(
            vec![
                WizardStep::new("remote", "Remote").with_validator(Arc::new(FailingValidator)),
                WizardStep::new("done", "Done"),
            ],
            Answers::default(),
        )
        .unwrap();

        assert_eq!(wizard.next().await, Navigation::Blocked);
        assert_eq!(wizard.current_step_index().await, 0);
    }

    #[tokio::test]
    async fn test_finish_only_from_last_step() {
        let wizard = wizard();
        let result = wizard.finish(|_| async { Ok(()) }).await;
        assert!(matches!(result, Err(TabulaError::Transition(_))));
    }

    #[tokio::test]
    async fn test_finish_blocked_then_completes() {
        let wizard = wizard();
        wizard.update_answers(|a| a.name = "Q3".into()).await;
        wizard.next().await;
        wizard.next().await;

        let blocked = wizard.finish(|_| async { Ok("sent") }).await.unwrap();
        assert!(blocked.is_none());
        assert!(!wizard.is_submitting());

        wizard.update_answers(|a| a.agreed = true).await;
        let done = wizard
            .finish(|answers| async move { Ok(answers.name) })
            .await
            .unwrap();
        assert_eq!(done.as_deref(), Some("Q3"));
        assert!(!wizard.is_submitting());
    }

    #[tokio::test]
    async fn test_busy_during_completion_rejects_second_finish() {
        let wizard = Arc::new(
            Wizard::new(vec![WizardStep::new("only", "Only")], Answers::default()).unwrap(),
        );
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let running = {
            let wizard = wizard.clone();
            tokio::spawn(async move {
                wizard
                    .finish(|_| async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok(1)
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        assert!(wizard.is_submitting());
        let second = wizard.finish(|_| async { Ok(2) }).await;
        assert!(matches!(second, Err(TabulaError::Transition(_))));

        release_tx.send(()).unwrap();
        assert_eq!(running.await.unwrap().unwrap(), Some(1));
        assert!(!wizard.is_submitting());
    }

    #[tokio::test]
    async fn test_failed_completion_clears_busy_flag() {
        let wizard =
            Wizard::new(vec![WizardStep::new("only", "Only")], Answers::default()).unwrap();
        let result: Result<Option<()>> = wizard
            .finish(|_| async { Err(TabulaError::http(500, "merge failed")) })
            .await;
        assert!(result.is_err());
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.current_step_index().await, 0);
    }

    #[test]
    fn test_empty_wizard_rejected() {
        assert!(Wizard::<Answers>::new(Vec::new(), Answers::default()).is_err());
    }
}
