//! Waiting for a remote run to finish.

use crate::error::DialogueError;
use crate::phase::ExchangePhase;
use rootcause::Report;
use smart_dialogue_assistants::{AssistantsBackend, Run, RunStatus};
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Default delay between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default limit on the total time spent waiting for a run.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// How a run is polled until it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks.
    pub interval: Duration,
    /// Overall time limit, measured from the first wait.
    pub timeout: Duration,
    /// Maximum number of status checks; `None` means unlimited.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// Creates a policy with the given interval and the default timeout.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Sets the overall time limit.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limits the number of status checks.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
            max_attempts: None,
        }
    }
}

/// Polls `run` until it completes.
///
/// The status returned when the run was created is checked first, so a run
/// that is already complete costs no extra request. Every wait and status
/// call is raced against the cancellation token and the overall deadline.
#[instrument(
    skip(backend, run, policy, cancel),
    fields(run_id = %run.id, thread_id = %run.thread_id)
)]
pub(crate) async fn wait_for_completion<B>(
    backend: &B,
    run: Run,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Run, Report<DialogueError>>
where
    B: AssistantsBackend + ?Sized,
{
    // A timeout too large to represent as an instant means no deadline.
    let deadline = Instant::now().checked_add(policy.timeout);
    let run_id = run.id.clone();
    let thread_id = run.thread_id.clone();
    let timed_out = || DialogueError::PollTimedOut {
        run_id: run_id.clone(),
        timeout: policy.timeout,
    };
    let cancelled = || DialogueError::Cancelled {
        phase: ExchangePhase::Polling,
    };

    let mut attempts: u32 = 0;
    let mut run = run;
    loop {
        match run.status {
            RunStatus::Completed => {
                debug!(attempts, "run completed");
                return Ok(run);
            }
            RunStatus::RequiresAction => {
                return Err(DialogueError::ActionRequired { run_id: run.id }.into());
            }
            status if status.is_terminal() => {
                return Err(DialogueError::RunEnded {
                    run_id: run.id,
                    status,
                    reason: run.last_error.map(|failure| failure.message),
                }
                .into());
            }
            status => debug!(%status, attempts, "run not finished"),
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(DialogueError::PollAttemptsExhausted {
                run_id: run.id,
                attempts,
            }
            .into());
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled().into()),
            () = wait_until(deadline) => return Err(timed_out().into()),
            () = sleep(policy.interval) => {}
        }

        attempts += 1;
        run = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(cancelled().into()),
            () = wait_until(deadline) => return Err(timed_out().into()),
            result = backend.get_run(&thread_id, &run_id) => {
                result.map_err(|report| {
                    report.context(DialogueError::Remote {
                        phase: ExchangePhase::Polling,
                    })
                })?
            }
        };
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use smart_dialogue_assistants::{
        Assistant, AssistantsError, RunFailure, RunRequest, ThreadMessage,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers status checks from a script; repeats the last status forever.
    struct StatusScript {
        statuses: Mutex<VecDeque<RunStatus>>,
        calls: Mutex<u32>,
    }

    impl StatusScript {
        fn new(statuses: &[RunStatus]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AssistantsBackend for StatusScript {
        async fn create_run(&self, _request: &RunRequest) -> Result<Run, Report<AssistantsError>> {
            unreachable!("polling never creates runs")
        }

        async fn get_run(
            &self,
            thread_id: &str,
            run_id: &str,
        ) -> Result<Run, Report<AssistantsError>> {
            *self.calls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                *statuses.front().unwrap()
            };
            Ok(Run {
                id: run_id.to_string(),
                thread_id: thread_id.to_string(),
                status,
                usage: None,
                last_error: (status == RunStatus::Failed).then(|| RunFailure {
                    code: "server_error".to_string(),
                    message: "model overloaded".to_string(),
                }),
            })
        }

        async fn list_messages(
            &self,
            _thread_id: &str,
        ) -> Result<Vec<ThreadMessage>, Report<AssistantsError>> {
            unreachable!("polling never lists messages")
        }

        async fn list_assistants(&self) -> Result<Vec<Assistant>, Report<AssistantsError>> {
            unreachable!("polling never lists assistants")
        }
    }

    fn queued() -> Run {
        Run {
            id: "run_1".to_string(),
            thread_id: "thread_1".to_string(),
            status: RunStatus::Queued,
            usage: None,
            last_error: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_completed() {
        let backend = StatusScript::new(&[
            RunStatus::InProgress,
            RunStatus::InProgress,
            RunStatus::Completed,
        ]);
        let started = Instant::now();

        let run = wait_for_completion(
            &backend,
            queued(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("completes");

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(backend.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn already_completed_run_needs_no_checks() {
        let backend = StatusScript::new(&[RunStatus::InProgress]);
        let mut run = queued();
        run.status = RunStatus::Completed;

        let run = wait_for_completion(
            &backend,
            run,
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("completes");

        assert!(run.status.is_completed());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out() {
        let backend = StatusScript::new(&[RunStatus::InProgress]);
        let policy = PollPolicy::new(Duration::from_secs(1)).with_timeout(Duration::from_secs(5));

        let err = wait_for_completion(&backend, queued(), &policy, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &DialogueError::PollTimedOut {
                run_id: "run_1".to_string(),
                timeout: Duration::from_secs(5),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_timeout_means_no_deadline() {
        let backend = StatusScript::new(&[RunStatus::InProgress, RunStatus::Completed]);
        let policy = PollPolicy::default().with_timeout(Duration::MAX);

        let run = wait_for_completion(&backend, queued(), &policy, &CancellationToken::new())
            .await
            .expect("completes");

        assert!(run.status.is_completed());
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_max_attempts() {
        let backend = StatusScript::new(&[RunStatus::Queued]);
        let policy = PollPolicy::default().with_max_attempts(3);

        let err = wait_for_completion(&backend, queued(), &policy, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &DialogueError::PollAttemptsExhausted {
                run_id: "run_1".to_string(),
                attempts: 3,
            }
        );
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_waiting() {
        let backend = StatusScript::new(&[RunStatus::InProgress]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let err = wait_for_completion(&backend, queued(), &PollPolicy::default(), &cancel)
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &DialogueError::Cancelled {
                phase: ExchangePhase::Polling,
            }
        );
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_reports_reason() {
        let backend = StatusScript::new(&[RunStatus::Failed]);

        let err = wait_for_completion(
            &backend,
            queued(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.current_context(),
            &DialogueError::RunEnded {
                run_id: "run_1".to_string(),
                status: RunStatus::Failed,
                reason: Some("model overloaded".to_string()),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_and_action_required_are_distinct() {
        let expired = StatusScript::new(&[RunStatus::Expired]);
        let err = wait_for_completion(
            &expired,
            queued(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.current_context(),
            DialogueError::RunEnded {
                status: RunStatus::Expired,
                ..
            }
        ));

        let action = StatusScript::new(&[RunStatus::RequiresAction]);
        let err = wait_for_completion(
            &action,
            queued(),
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.current_context(),
            DialogueError::ActionRequired { .. }
        ));
    }
}
