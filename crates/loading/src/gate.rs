//! Render gate: decides between real content and the fallback visual.

use orca_core::FallbackVisual;

use crate::events::{callback, Callback};

/// Properties of one render of the gate.
pub struct LoadItem<T> {
    /// Real content
    pub children: T,

    /// Overrides the scope's default fallback
    pub fallback: Option<FallbackVisual>,

    /// Registered as the current mount callback
    pub on_mount: Option<Callback>,

    /// Registered as the current loaded callback
    pub on_loaded: Option<Callback>,

    /// Caller asserts the data is ready
    pub is_loaded: bool,
}

impl<T> LoadItem<T> {
    /// Gate around `children` with no overrides.
    pub fn new(children: T) -> Self {
        Self {
            children,
            fallback: None,
            on_mount: None,
            on_loaded: None,
            is_loaded: false,
        }
    }

    /// Use this fallback instead of the scope default.
    pub fn fallback(mut self, fallback: FallbackVisual) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Callback for the mount edge.
    pub fn on_mount(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_mount = Some(callback(f));
        self
    }

    /// Callback for the loaded edge.
    pub fn on_loaded(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_loaded = Some(callback(f));
        self
    }

    /// Set the data-ready hint.
    pub fn loaded(mut self, is_loaded: bool) -> Self {
        self.is_loaded = is_loaded;
        self
    }
}

/// Output of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    /// Real content
    Content(T),

    /// Placeholder
    Fallback(FallbackVisual),
}

impl<T> Rendered<T> {
    /// Whether real content was rendered.
    pub fn is_content(&self) -> bool {
        matches!(self, Rendered::Content(_))
    }

    /// The content, if rendered.
    pub fn content(self) -> Option<T> {
        match self {
            Rendered::Content(content) => Some(content),
            Rendered::Fallback(_) => None,
        }
    }

    /// The fallback, if rendered.
    pub fn fallback(&self) -> Option<&FallbackVisual> {
        match self {
            Rendered::Content(_) => None,
            Rendered::Fallback(fallback) => Some(fallback),
        }
    }

    /// Map the content.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rendered<U> {
        match self {
            Rendered::Content(content) => Rendered::Content(f(content)),
            Rendered::Fallback(fallback) => Rendered::Fallback(fallback),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Rendered<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendered::Content(content) => content.fmt(f),
            Rendered::Fallback(fallback) => fallback.fmt(f),
        }
    }
}
