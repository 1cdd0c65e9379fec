//! Classification of terminal redirect URLs.
//!
//! Providers that complete in an external browser signal their result by
//! navigating to one of three configured URLs. Every other URL the browser
//! visits on the way is ignored.

use serde::{Deserialize, Serialize};
use url::Url;

/// Result of classifying one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectOutcome {
    Success,
    Failure,
    Cancelled,
    /// Browser is still navigating; no decision.
    Ignored,
}

impl RedirectOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RedirectOutcome::Ignored)
    }
}

/// The three URL templates a provider redirects to when it is done.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectTemplates {
    pub success: String,
    pub failure: String,
    pub cancel: String,
}

impl RedirectTemplates {
    pub fn new(
        success: impl Into<String>,
        failure: impl Into<String>,
        cancel: impl Into<String>,
    ) -> Self {
        Self {
            success: success.into(),
            failure: failure.into(),
            cancel: cancel.into(),
        }
    }

    /// Classifies a URL by substring match against the templates. When
    /// several templates match, the longest one wins, so a failure URL
    /// nested under the success URL still classifies as a failure.
    pub fn classify(&self, url: &str) -> RedirectOutcome {
        classify(self, url)
    }
}

/// Pure classification function; see [`RedirectTemplates::classify`].
///
/// Empty templates never match. Equal-length matches resolve in success,
/// failure, cancel order.
pub fn classify(templates: &RedirectTemplates, url: &str) -> RedirectOutcome {
    [
        (templates.success.as_str(), RedirectOutcome::Success),
        (templates.failure.as_str(), RedirectOutcome::Failure),
        (templates.cancel.as_str(), RedirectOutcome::Cancelled),
    ]
    .into_iter()
    .filter(|(template, _)| !template.is_empty() && url.contains(template))
    .fold(None, |best: Option<(usize, RedirectOutcome)>, (template, outcome)| {
        match best {
            Some((len, _)) if len >= template.len() => best,
            _ => Some((template.len(), outcome)),
        }
    })
    .map_or(RedirectOutcome::Ignored, |(_, outcome)| outcome)
}

/// Reads one query parameter from a redirect URL.
///
/// Returns `None` for unparsable URLs and for empty values.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
