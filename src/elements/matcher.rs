//! Short-circuiting fluent matcher.
//!
//! [`Matcher`] wraps a single candidate value with a matched flag and chains read-only
//! queries without verbose nested branching. Once a link in the chain fails, every
//! later predicate, projection or action is skipped - the chain stays unmatched no
//! matter what follows. Steps and translators use it to test-and-extract from elements
//! in one expression.
//!
//! Variant narrowing is expressed as a projection closure returning `Option`
//! ([`Matcher::narrow`]) rather than a dynamic downcast, so the compiler checks the
//! variant set exhaustively at the closure site.

/// A candidate value plus a matched flag, threaded through a fluent chain.
///
/// Purely transient: build one, chain queries, extract with [`Matcher::choose`] or
/// [`Matcher::assign_to`], and drop it. An unmatched matcher carries no value at all,
/// which is what makes skipped projections representable without `Default`.
#[derive(Debug)]
pub struct Matcher<T> {
    target: Option<T>,
}

impl<T> Matcher<T> {
    /// Start a chain over `target`, initially matched.
    #[must_use]
    pub fn of(target: T) -> Self {
        Matcher {
            target: Some(target),
        }
    }

    /// An unmatched matcher carrying no value.
    #[must_use]
    pub fn unmatched() -> Self {
        Matcher { target: None }
    }

    /// Whether the chain is still matched.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.target.is_some()
    }

    /// ANDs the matched flag with `predicate`.
    ///
    /// When the chain is already unmatched the predicate is never invoked.
    #[must_use]
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Self {
        match self.target {
            Some(target) if predicate(&target) => Matcher::of(target),
            _ => Matcher::unmatched(),
        }
    }

    /// Attempts to narrow the target to another shape.
    ///
    /// `project` returns `Some` with the narrowed value on success; `None` leaves
    /// the chain unmatched. Typical use is projecting an enum to one variant's
    /// payload.
    #[must_use]
    pub fn narrow<U>(self, project: impl FnOnce(T) -> Option<U>) -> Matcher<U> {
        Matcher {
            target: self.target.and_then(project),
        }
    }

    /// Narrows and filters in one link: [`Matcher::narrow`] then [`Matcher::filter`]
    /// against the narrowed value.
    #[must_use]
    pub fn narrow_filter<U>(
        self,
        project: impl FnOnce(T) -> Option<U>,
        predicate: impl FnOnce(&U) -> bool,
    ) -> Matcher<U> {
        self.narrow(project).filter(predicate)
    }

    /// Maps the target through `project`, carrying the matched flag unchanged.
    ///
    /// An unmatched chain yields an unmatched `Matcher<U>` without invoking
    /// `project`.
    #[must_use]
    pub fn map<U>(self, project: impl FnOnce(T) -> U) -> Matcher<U> {
        Matcher {
            target: self.target.map(project),
        }
    }

    /// Writes the target into `out` when matched, clears it otherwise.
    ///
    /// Returns the matcher unchanged so the chain can continue.
    #[must_use]
    pub fn assign_to(self, out: &mut Option<T>) -> Self
    where
        T: Clone,
    {
        out.clone_from(&self.target);
        self
    }

    /// Invokes `action` with the target, only when matched.
    pub fn inspect(self, action: impl FnOnce(&T)) -> Self {
        if let Some(target) = &self.target {
            action(target);
        }
        self
    }

    /// Consumes the chain: applies `if_matched` to the target when matched,
    /// otherwise returns `fallback` without materializing the matched arm.
    pub fn choose<R>(self, if_matched: impl FnOnce(T) -> R, fallback: R) -> R {
        match self.target {
            Some(target) => if_matched(target),
            None => fallback,
        }
    }
}
