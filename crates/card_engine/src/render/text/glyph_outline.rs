//! Glyph outline service boundary

use std::future::Future;
use std::pin::Pin;

use crate::physics::collision::AABB;
use crate::render::primitives::Mesh;

use super::FontError;

/// Pending font load
pub type FontFuture<F> = Pin<Box<dyn Future<Output = Result<F, FontError>>>>;

/// Extruded text mesh and its bounds
///
/// Glyphs sit on the baseline at y = 0 and extrude from z = 0 towards +Z.
#[derive(Debug, Clone)]
pub struct GlyphOutline {
    /// Outline geometry in label-local space
    pub mesh: Mesh,
    /// Bounding box of `mesh`
    pub bounds: AABB,
}

/// Turns text into extruded outline meshes
pub trait GlyphOutliner {
    /// Loaded font handle
    type Font;

    /// Start loading the font at `url`
    ///
    /// Called once per [`LabelBuilder`](super::LabelBuilder); the result is
    /// memoized in a [`FontSlot`].
    fn load_font(&self, url: &str) -> FontFuture<Self::Font>;

    /// Outline `text` at `size` with `extrusion` depth
    fn outline(
        &self,
        text: &str,
        font: &Self::Font,
        size: f32,
        extrusion: f32,
    ) -> Result<GlyphOutline, FontError>;
}

/// Memoized one-shot font load
///
/// Every caller awaits the same pending load. Once it settles the slot
/// holds the font (or the failure) and later calls return immediately.
pub enum FontSlot<F> {
    /// Load in flight
    Pending(FontFuture<F>),
    /// Font available
    Ready(F),
    /// Load failed with this message
    Failed(String),
}

impl<F> FontSlot<F> {
    /// Wait for the load to settle and return the font
    pub async fn resolve(&mut self) -> Result<&F, FontError> {
        if let Self::Pending(load) = self {
            let outcome = load.await;
            *self = match outcome {
                Ok(font) => {
                    log::info!("Font loaded");
                    Self::Ready(font)
                }
                Err(err) => {
                    log::error!("Font load failed: {}", err);
                    Self::Failed(err.to_string())
                }
            };
        }

        match self {
            Self::Ready(font) => Ok(font),
            Self::Failed(message) => Err(FontError::FontUnavailable(message.clone())),
            Self::Pending(_) => Err(FontError::FontUnavailable("font load still pending".to_string())),
        }
    }

    /// True once the font is available
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl<F> std::fmt::Debug for FontSlot<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending(_) => f.write_str("FontSlot::Pending"),
            Self::Ready(_) => f.write_str("FontSlot::Ready"),
            Self::Failed(message) => write!(f, "FontSlot::Failed({message})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    /// Future that is pending on its first poll
    struct YieldOnce {
        polled: bool,
        polls: Rc<Cell<u32>>,
    }

    impl Future for YieldOnce {
        type Output = Result<u32, FontError>;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            self.polls.set(self.polls.get() + 1);
            if self.polled {
                Poll::Ready(Ok(42))
            } else {
                self.polled = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    #[test]
    fn test_pending_load_resolves_once() {
        let polls = Rc::new(Cell::new(0));
        let mut slot = FontSlot::Pending(Box::pin(YieldOnce { polled: false, polls: Rc::clone(&polls) }));
        assert!(!slot.is_ready());

        assert_eq!(pollster::block_on(slot.resolve()).copied(), Ok(42));
        assert!(slot.is_ready());
        assert_eq!(polls.get(), 2);

        // Memoized: no further polling
        assert_eq!(pollster::block_on(slot.resolve()).copied(), Ok(42));
        assert_eq!(polls.get(), 2);
    }

    #[test]
    fn test_failed_load_stays_failed() {
        let mut slot: FontSlot<u32> =
            FontSlot::Pending(Box::pin(async { Err::<u32, _>(FontError::FontUnavailable("404".into())) }));

        let first = pollster::block_on(slot.resolve()).copied();
        assert!(matches!(first, Err(FontError::FontUnavailable(_))));
        assert!(matches!(slot, FontSlot::Failed(_)));
        assert!(pollster::block_on(slot.resolve()).is_err());
    }
}
