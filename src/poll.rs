use std::time::Duration;

/// How long to wait before each history query.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay before every attempt.
    Fixed(Duration),
    /// `initial + step * attempt`, capped at `max`.
    Linear {
        initial: Duration,
        step: Duration,
        max: Duration,
    },
    /// Explicit per-attempt delays. The last entry repeats once exhausted.
    Schedule(Vec<Duration>),
}

impl Backoff {
    /// Delay before the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Linear { initial, step, max } => {
                initial.saturating_add(step.saturating_mul(attempt)).min(*max)
            }
            Backoff::Schedule(delays) => delays
                .get(attempt as usize)
                .or_else(|| delays.last())
                .copied()
                .unwrap_or(Duration::ZERO),
        }
    }
}

/// Bounded polling for [`ComfyClient::wait_for_completion`](crate::ComfyClient::wait_for_completion).
///
/// The default mirrors a typical manual polling loop: eight attempts spaced
/// 10, 10, 20, 30, 40, 50, 60 and 60 seconds apart, with no overall deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Maximum number of history queries (0 = no query at all).
    pub max_attempts: u32,

    /// Delay before each query.
    pub backoff: Backoff,

    /// Overall deadline across all attempts.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff: Backoff::Schedule(
                [10, 10, 20, 30, 40, 50, 60, 60]
                    .into_iter()
                    .map(Duration::from_secs)
                    .collect(),
            ),
            timeout: None,
        }
    }
}

impl PollPolicy {
    /// Start building a policy with the builder pattern.
    pub fn builder() -> PollPolicyBuilder {
        PollPolicyBuilder::default()
    }

    /// Delay before the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay_for(attempt)
    }
}

/// Builder for [`PollPolicy`].
#[derive(Default)]
pub struct PollPolicyBuilder {
    policy: PollPolicy,
}

impl PollPolicyBuilder {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    /// Poll at a fixed interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.policy.backoff = Backoff::Fixed(interval);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.policy.backoff = backoff;
        self
    }

    /// Give up once this much time has passed, regardless of attempts left.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = Some(timeout);
        self
    }

    /// Build the final [`PollPolicy`].
    pub fn build(self) -> PollPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 8);
        assert!(policy.timeout.is_none());
        let delays: Vec<u64> = (0..8).map(|i| policy.delay_for(i).as_secs()).collect();
        assert_eq!(delays, [10, 10, 20, 30, 40, 50, 60, 60]);
    }

    #[test]
    fn test_schedule_repeats_last() {
        let backoff = Backoff::Schedule(vec![Duration::from_secs(1), Duration::from_secs(5)]);
        assert_eq!(backoff.delay_for(0), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(1), Duration::from_secs(5));
        assert_eq!(backoff.delay_for(9), Duration::from_secs(5));
        assert_eq!(Backoff::Schedule(vec![]).delay_for(3), Duration::ZERO);
    }

    #[test]
    fn test_linear_is_capped() {
        let backoff = Backoff::Linear {
            initial: Duration::from_secs(2),
            step: Duration::from_secs(3),
            max: Duration::from_secs(10),
        };
        assert_eq!(backoff.delay_for(0), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(8));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(10));
        assert_eq!(backoff.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_builder() {
        let policy = PollPolicy::builder()
            .with_max_attempts(3)
            .with_interval(Duration::from_millis(250))
            .with_timeout(Duration::from_secs(5))
            .build();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(2), Duration::from_millis(250));
        assert_eq!(policy.timeout, Some(Duration::from_secs(5)));
    }
}
