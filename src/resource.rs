//! Generic lazy-load/invalidate/poll base every server-side resource
//! (account, order, authorization, challenge, renewal info) is built
//! on top of.
use crate::error::Result;
use crate::login::Login;
use crate::time::Clock;
use crate::transport::{parse_retry_after, RetryStrategy};
use crate::types::Status;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;

/// Resources whose JSON representation carries a lifecycle `status`,
/// the only property `wait_until_status` needs to know about.
pub trait HasStatus {
    fn status(&self) -> Status;
}

/// A server resource addressed by URL, with its last-fetched
/// representation cached until explicitly invalidated or re-fetched.
pub struct Resource<D> {
    location: String,
    login: Login,
    cached: Mutex<Option<D>>,
}

impl<D> Resource<D>
where
    D: Clone + DeserializeOwned + HasStatus,
{
    pub fn new(location: impl Into<String>, login: Login) -> Self {
        Self {
            location: location.into(),
            login,
            cached: Mutex::new(None),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    /// The cached representation if one exists, otherwise fetch it.
    pub async fn get(&self) -> Result<D> {
        {
            let cached = self.cached.lock().await;
            if let Some(data) = cached.as_ref() {
                return Ok(data.clone());
            }
        }
        self.fetch().await
    }

    /// Unconditionally re-fetch and replace the cached value.
    pub async fn fetch(&self) -> Result<D> {
        let (data, _retry_after) = self.fetch_with_retry_after().await?;
        Ok(data)
    }

    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        *cached = None;
    }

    /// Replace the cached value directly, without a network round-trip
    /// — the `setJson` half of the lazy-load contract, used after a
    /// mutation whose response body is the resource's new state.
    pub async fn set_cached(&self, data: D) {
        let mut cached = self.cached.lock().await;
        *cached = Some(data);
    }

    async fn fetch_with_retry_after(&self) -> Result<(D, Option<Duration>)> {
        let (view, response) = self.login.post_as_get(&self.location).await?;
        let data: D = view.as_typed()?;

        let retry_after = response
            .header("retry-after")
            .and_then(|value| parse_retry_after(value, jiff::Timestamp::now()))
            .map(|at| duration_until(at, jiff::Timestamp::now()));

        let mut cached = self.cached.lock().await;
        *cached = Some(data.clone());
        Ok((data, retry_after))
    }

    /// Poll until the resource reaches one of `target_statuses` or any
    /// terminal status, honoring a server `Retry-After` when present
    /// and otherwise backing off per [`RetryStrategy::polling`].
    ///
    /// Bounded by `timeout`: a zero timeout returns
    /// [`AcmeError::TimeoutExceeded`] before any network call (§8
    /// boundary behavior); otherwise each sleep is clamped to the
    /// remaining deadline and a request that would start after the
    /// deadline has passed surfaces the same error instead.
    pub async fn wait_until_status(
        &self,
        target_statuses: &[Status],
        timeout: Duration,
        clock: &dyn Clock,
    ) -> Result<D> {
        let start = clock.now();
        let deadline = start
            .checked_add(jiff::Span::new().seconds(timeout.as_secs() as i64))
            .unwrap_or(start);
        if start >= deadline {
            return Err(crate::error::AcmeError::TimeoutExceeded);
        }
        let strategy = RetryStrategy::polling();
        let mut attempt = 0u32;
        loop {
            let (data, retry_after) = self.fetch_with_retry_after().await?;
            if target_statuses.contains(&data.status()) || data.status().is_terminal() {
                return Ok(data);
            }
            let now = clock.now();
            if now >= deadline {
                return Err(crate::error::AcmeError::TimeoutExceeded);
            }
            let remaining = duration_until(deadline, now);
            let delay = retry_after.unwrap_or_else(|| strategy.delay(attempt)).min(remaining);
            clock.sleep(delay).await;
            attempt += 1;
        }
    }
}

fn duration_until(target: jiff::Timestamp, now: jiff::Timestamp) -> Duration {
    let seconds = (target.as_second() - now.as_second()).max(0);
    Duration::from_secs(seconds as u64)
}
