/// A derived value that is either up to date or needs recomputing.
///
/// Writers call [`Cached::invalidate`] whenever an input changes; readers go
/// through [`Cached::get_or_update`], which recomputes at most once per
/// invalidation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cached<T> {
    #[default]
    Dirty,
    Clean(T),
}

impl<T> Cached<T> {
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty)
    }

    /// Mark the value stale. Unconditional: already-dirty stays dirty.
    pub fn invalidate(&mut self) {
        *self = Self::Dirty;
    }

    /// The cached value, if clean.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Clean(value) => Some(value),
            Self::Dirty => None,
        }
    }

    /// Store a freshly computed value.
    pub fn set(&mut self, value: T) {
        *self = Self::Clean(value);
    }

    /// Return the cached value, recomputing it first if dirty.
    pub fn get_or_update(&mut self, update: impl FnOnce() -> T) -> &T {
        if self.is_dirty() {
            *self = Self::Clean(update());
        }
        match self {
            Self::Clean(value) => value,
            Self::Dirty => unreachable!("cache refreshed above"),
        }
    }
}
