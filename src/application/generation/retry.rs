//! 重试策略
//!
//! 只对临时过载错误重试，等待时间为 base_delay * 2^已重试次数；
//! 其他错误立即原样返回。策略本身不关心被包装的操作做什么。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::application::ports::LlmError;

/// 默认最大重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// 默认基础等待时间（毫秒）
pub const DEFAULT_BASE_DELAY_MS: u64 = 2000;

/// 可判定是否为临时错误的错误类型
pub trait TransientError {
    fn is_transient(&self) -> bool;
}

impl TransientError for LlmError {
    fn is_transient(&self) -> bool {
        LlmError::is_transient(self)
    }
}

/// 指数退避重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次调用）
    pub max_retries: u32,
    /// 基础等待时间
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// 第 retries_used 次重试前的等待时间
    pub fn delay_for(&self, retries_used: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retries_used))
    }

    /// 执行操作，临时错误时按策略重试
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: TransientError + Display,
    {
        let mut retries_used = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && retries_used < self.max_retries => {
                    let delay = self.delay_for(retries_used);
                    tracing::warn!(
                        retry = retries_used + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Provider overloaded, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retries_used += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        tracing::error!(
                            retries = retries_used,
                            error = %err,
                            "Retry budget exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn overloaded() -> LlmError {
        LlmError::Status {
            status: 503,
            message: "model overloaded".to_string(),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(8000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt_with_doubling_delays() {
        let policy = RetryPolicy::default();
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let result: Result<&str, LlmError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    let mut calls = calls.lock().unwrap();
                    calls.push(Instant::now());
                    if calls.len() < 3 {
                        Err(overloaded())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1] - calls[0];
        let second_gap = calls[2] - calls[1];
        assert_eq!(first_gap, Duration::from_millis(2000));
        assert_eq!(second_gap, Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_fails_immediately() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(Mutex::new(0usize));
        let started = Instant::now();

        let result: Result<(), LlmError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Err(LlmError::Status {
                        status: 400,
                        message: "bad request".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(LlmError::Status { status: 400, .. })));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_propagates_last_error() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(Mutex::new(0usize));
        let started = Instant::now();

        let result: Result<(), LlmError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Err(overloaded())
                }
            })
            .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(*calls.lock().unwrap(), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(2000 + 4000 + 8000));
    }
}
