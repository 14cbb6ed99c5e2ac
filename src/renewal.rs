//! ACME Renewal Information (ARI): a suggested renewal window for one
//! certificate, and the disjoint-interval classification a client uses
//! to decide when to act on it.
use crate::error::Result;
use crate::login::Login;
use crate::resource::HasStatus;
use crate::time::{random_instant_in, Rng};
use crate::types::Status;
use jiff::{Span, Timestamp};
use serde::{Deserialize, Serialize};

/// The RenewalInfo resource's JSON representation (draft-ietf-acme-ari).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalInfoData {
    #[serde(rename = "suggestedWindow")]
    pub suggested_window: SuggestedWindow,
    #[serde(rename = "explanationURL", skip_serializing_if = "Option::is_none", default)]
    pub explanation_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// RenewalInfo carries no lifecycle status of its own; it is never a
/// polling target, but the generic resource machinery this crate reuses
/// elsewhere expects `HasStatus`, so it reports a fixed `valid`.
impl HasStatus for RenewalInfoData {
    fn status(&self) -> Status {
        Status::Valid
    }
}

/// A bound RenewalInfo resource: `<renewalInfo>/<certId>`, fetched by
/// plain (unauthenticated) GET or a conditional re-fetch, per the ARI
/// draft — unlike every other resource, this one is not POST-as-GET.
pub struct RenewalInfo {
    location: String,
    login: Login,
}

impl RenewalInfo {
    pub fn bind(location: impl Into<String>, login: Login) -> Self {
        Self {
            location: location.into(),
            login,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub async fn get(&self) -> Result<RenewalInfoData> {
        let connection = self.login.session.connection().await?;
        let view = connection.get(&self.location).await?;
        view.as_typed()
    }

    /// `true` if `now` is before the suggested window, i.e. renewal is
    /// not yet necessary.
    pub fn renewal_is_not_required(window: &SuggestedWindow, now: Timestamp) -> bool {
        now < window.start
    }

    /// `true` if `now` falls within `[start, end)`: the CA recommends
    /// renewing now.
    pub fn renewal_is_recommended(window: &SuggestedWindow, now: Timestamp) -> bool {
        now >= window.start && now < window.end
    }

    /// `true` if `now` is at or past the end of the window: renewal is
    /// overdue.
    pub fn renewal_is_overdue(window: &SuggestedWindow, now: Timestamp) -> bool {
        now >= window.end
    }

    /// A uniformly random instant in `[start, end - lead_time]`, or
    /// `None` if that interval is non-positive or already past.
    pub fn get_random_proposal(
        window: &SuggestedWindow,
        lead_time: Option<Span>,
        now: Timestamp,
        rng: &dyn Rng,
    ) -> Option<Timestamp> {
        if window.end <= now {
            return None;
        }
        let adjusted_end = match lead_time {
            Some(lead) => window.end.checked_sub(lead).ok()?,
            None => window.end,
        };
        if adjusted_end <= window.start {
            return None;
        }
        Some(random_instant_in(window.start, adjusted_end, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng(f64);
    impl Rng for FixedRng {
        fn next_f64(&self) -> f64 {
            self.0
        }
    }

    fn window() -> SuggestedWindow {
        SuggestedWindow {
            start: "2026-01-10T00:00:00Z".parse().unwrap(),
            end: "2026-01-20T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn classification_intervals_are_disjoint_and_exhaustive() {
        let w = window();
        let before: Timestamp = "2026-01-05T00:00:00Z".parse().unwrap();
        let inside: Timestamp = "2026-01-15T00:00:00Z".parse().unwrap();
        let after: Timestamp = "2026-01-25T00:00:00Z".parse().unwrap();

        assert!(RenewalInfo::renewal_is_not_required(&w, before));
        assert!(!RenewalInfo::renewal_is_recommended(&w, before));
        assert!(!RenewalInfo::renewal_is_overdue(&w, before));

        assert!(!RenewalInfo::renewal_is_not_required(&w, inside));
        assert!(RenewalInfo::renewal_is_recommended(&w, inside));
        assert!(!RenewalInfo::renewal_is_overdue(&w, inside));

        assert!(!RenewalInfo::renewal_is_not_required(&w, after));
        assert!(!RenewalInfo::renewal_is_recommended(&w, after));
        assert!(RenewalInfo::renewal_is_overdue(&w, after));
    }

    #[test]
    fn random_proposal_respects_lead_time() {
        let w = window();
        let now: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        let rng = FixedRng(0.99);
        let lead = Span::new().hours(24);
        let proposal = RenewalInfo::get_random_proposal(&w, Some(lead), now, &rng).unwrap();
        assert!(proposal < w.end);
        assert!(proposal <= w.end.checked_sub(lead).unwrap());
    }

    #[test]
    fn random_proposal_is_none_when_window_already_passed() {
        let w = window();
        let now: Timestamp = "2026-02-01T00:00:00Z".parse().unwrap();
        let rng = FixedRng(0.5);
        assert!(RenewalInfo::get_random_proposal(&w, None, now, &rng).is_none());
    }

    #[test]
    fn scenario_f_renewal_window_boundaries() {
        let w = SuggestedWindow {
            start: "2021-01-03T00:00:00Z".parse().unwrap(),
            end: "2021-01-07T00:00:00Z".parse().unwrap(),
        };
        let just_before: Timestamp = "2021-01-02T23:59:59Z".parse().unwrap();
        assert!(RenewalInfo::renewal_is_not_required(&w, just_before));

        let at_start: Timestamp = "2021-01-03T00:00:00Z".parse().unwrap();
        assert!(RenewalInfo::renewal_is_recommended(&w, at_start));

        let at_end: Timestamp = "2021-01-07T00:00:00Z".parse().unwrap();
        assert!(RenewalInfo::renewal_is_overdue(&w, at_end));
    }
}
