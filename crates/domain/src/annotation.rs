use chrono::{DateTime, Utc};
use metasync_core::AppResult;
use serde::{Deserialize, Serialize};

/// Upstream throttling state observed on a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStatus {
    /// Request was served.
    Ok,
    /// Request was rejected for exceeding the limit.
    Overlimit,
}

/// Rate-limit metadata extracted from an upstream response.
///
/// Rides alongside call results for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Requests allowed in the current window.
    pub limit: Option<u64>,
    /// Requests left in the current window.
    pub remaining: Option<u64>,
    /// When the window resets.
    pub reset_at: Option<DateTime<Utc>>,
    /// Whether the request itself was throttled.
    pub status: RateLimitStatus,
}

/// Side-channel metadata attached to an operation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Latest rate-limit state seen during the operation.
    RateLimit(RateLimitInfo),
    /// A grant request found the membership already present.
    GrantAlreadyExists,
    /// A revoke request found no membership to remove.
    GrantAlreadyRevoked,
}

/// Ordered collection of annotations; at most one of each kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an annotation of the same kind.
    pub fn update(&mut self, annotation: Annotation) {
        let kind = std::mem::discriminant(&annotation);
        match self
            .0
            .iter_mut()
            .find(|existing| std::mem::discriminant(*existing) == kind)
        {
            Some(existing) => *existing = annotation,
            None => self.0.push(annotation),
        }
    }

    /// Records rate-limit info when present.
    pub fn with_rate_limit(&mut self, rate_limit: Option<RateLimitInfo>) {
        if let Some(info) = rate_limit {
            self.update(Annotation::RateLimit(info));
        }
    }

    /// Returns the most recent rate-limit info.
    #[must_use]
    pub fn rate_limit(&self) -> Option<&RateLimitInfo> {
        self.0.iter().find_map(|annotation| match annotation {
            Annotation::RateLimit(info) => Some(info),
            _ => None,
        })
    }

    /// Returns true when the annotation is present.
    #[must_use]
    pub fn contains(&self, annotation: &Annotation) -> bool {
        self.0.contains(annotation)
    }

    /// Returns true when no annotation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }
}

/// Operation result paired with the annotations gathered while producing it.
///
/// Annotations survive failures so throttling data from a failed call still
/// reaches the caller.
#[derive(Debug)]
pub struct Annotated<T> {
    /// Metadata gathered during the call.
    pub annotations: Annotations,
    /// Operation result.
    pub result: AppResult<T>,
}

impl<T> Annotated<T> {
    /// Pairs a result with annotations.
    #[must_use]
    pub fn new(annotations: Annotations, result: AppResult<T>) -> Self {
        Self {
            annotations,
            result,
        }
    }

    /// Wraps a successful value.
    #[must_use]
    pub fn ok(annotations: Annotations, value: T) -> Self {
        Self::new(annotations, Ok(value))
    }

    /// Wraps a failure.
    #[must_use]
    pub fn err(annotations: Annotations, error: metasync_core::AppError) -> Self {
        Self::new(annotations, Err(error))
    }

    /// Maps the successful value.
    #[must_use]
    pub fn map<U>(self, map: impl FnOnce(T) -> U) -> Annotated<U> {
        Annotated::new(self.annotations, self.result.map(map))
    }

    /// Splits into annotations and result.
    #[must_use]
    pub fn into_parts(self) -> (Annotations, AppResult<T>) {
        (self.annotations, self.result)
    }
}
