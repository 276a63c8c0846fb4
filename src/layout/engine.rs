//! Debounced pagination engine

use crate::error::ConfigError;
use crate::layout::geometry::PageGeometry;
use crate::layout::pagination::{paginate, PaginationState};
use crate::schedule::{Clock, Debouncer, SystemClock};
use std::cell::Cell;
use std::time::Duration;

/// Default quiet window before recomputing, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

/// Source of the current content height
pub trait ContentHeightProvider {
    /// Current height of the content flow, `None` when it cannot be measured
    fn content_height(&self) -> Option<f32>;
}

impl ContentHeightProvider for f32 {
    fn content_height(&self) -> Option<f32> {
        Some(*self)
    }
}

impl ContentHeightProvider for Cell<f32> {
    fn content_height(&self) -> Option<f32> {
        Some(self.get())
    }
}

impl ContentHeightProvider for Option<f32> {
    fn content_height(&self) -> Option<f32> {
        *self
    }
}

/// Channel a "height may have changed" notification arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// Edit made through the editing surface
    Content,
    /// Rendered size changed without an edit (table resize, list renumbering)
    Resize,
}

/// Summary of one recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationUpdate {
    pub previous_total_pages: usize,
    pub total_pages: usize,
    pub generation: u64,
}

impl PaginationUpdate {
    pub fn page_count_changed(&self) -> bool {
        self.previous_total_pages != self.total_pages
    }
}

/// Keeps a [`PaginationState`] in sync with a changing content height.
///
/// Notifications only (re)schedule the debounce timer. The measurement and
/// recomputation happen in [`poll`](Self::poll) once the window has elapsed,
/// and replace the whole state at once.
pub struct PaginationEngine<C: Clock = SystemClock> {
    geometry: PageGeometry,
    debouncer: Debouncer,
    clock: C,
    state: PaginationState,
    torn_down: bool,
}

impl PaginationEngine<SystemClock> {
    /// Engine on the host wall clock with the default debounce window
    pub fn with_system_clock(geometry: PageGeometry) -> Result<Self, ConfigError> {
        Self::new(
            geometry,
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            SystemClock::new(),
        )
    }
}

impl<C: Clock> PaginationEngine<C> {
    /// Fails when `geometry` has no positive pagination unit
    pub fn new(geometry: PageGeometry, debounce: Duration, clock: C) -> Result<Self, ConfigError> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            debouncer: Debouncer::new(debounce),
            clock,
            state: PaginationState::default(),
            torn_down: false,
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Latest complete pagination result
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn page_count(&self) -> usize {
        self.state.total_pages
    }

    /// Record a change notification. Returns false once torn down.
    pub fn notify(&mut self, source: ChangeSource) -> bool {
        if self.torn_down {
            log::debug!("ignoring {source:?} notification after teardown");
            return false;
        }
        self.debouncer.trigger(self.clock.now());
        true
    }

    /// Whether a recomputation is scheduled
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Time until the scheduled recomputation is due
    pub fn time_until_due(&self) -> Option<Duration> {
        self.debouncer.remaining(self.clock.now())
    }

    /// Run the scheduled recomputation if its window has elapsed
    pub fn poll<P>(&mut self, provider: &P) -> Option<PaginationUpdate>
    where
        P: ContentHeightProvider + ?Sized,
    {
        if self.torn_down || !self.debouncer.fire_if_due(self.clock.now()) {
            return None;
        }
        Some(self.recompute(provider))
    }

    /// Recompute immediately, superseding any scheduled recomputation
    pub fn recalculate_now<P>(&mut self, provider: &P) -> Option<PaginationUpdate>
    where
        P: ContentHeightProvider + ?Sized,
    {
        if self.torn_down {
            return None;
        }
        self.debouncer.cancel();
        Some(self.recompute(provider))
    }

    /// Cancel pending work and stop reacting to notifications
    pub fn teardown(&mut self) {
        if self.debouncer.cancel() {
            log::debug!("cancelled pending pagination on teardown");
        }
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn recompute<P>(&mut self, provider: &P) -> PaginationUpdate
    where
        P: ContentHeightProvider + ?Sized,
    {
        let measured = provider.content_height();
        let raw_height = match measured {
            Some(h) if h.is_finite() && h >= 0.0 => h,
            other => {
                log::debug!("content height {other:?} is unusable, treating as 0");
                0.0
            }
        };

        let previous_total_pages = self.state.total_pages;
        let generation = self.state.generation + 1;

        let mut next = paginate(raw_height, self.geometry.content_height_px);
        next.generation = generation;
        self.state = next;

        log::debug!(
            "pagination #{generation}: height {raw_height} -> {} pages ({} breaks)",
            self.state.total_pages,
            self.state.page_breaks.len()
        );

        PaginationUpdate {
            previous_total_pages,
            total_pages: self.state.total_pages,
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageSetup;
    use crate::schedule::VirtualClock;

    const P: f32 = 864.0;

    fn engine() -> (PaginationEngine<VirtualClock>, VirtualClock) {
        let clock = VirtualClock::new();
        let engine = PaginationEngine::new(
            PageGeometry::default(),
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            clock.clone(),
        )
        .unwrap();
        (engine, clock)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_initial_state_is_single_page() {
        let (engine, _) = engine();
        assert_eq!(engine.page_count(), 1);
        assert!(engine.state().page_breaks.is_empty());
        assert_eq!(engine.state().generation, 0);
    }

    #[test]
    fn test_burst_coalesces_into_one_recompute() {
        let (mut engine, clock) = engine();
        let height = Cell::new(100.0);

        engine.notify(ChangeSource::Content);
        clock.advance(ms(100));
        height.set(2.0 * P + 5.0);
        engine.notify(ChangeSource::Resize);

        // First window would have elapsed here, but the second trigger reset it
        clock.advance(ms(60));
        assert_eq!(engine.poll(&height), None);

        // Height changes again before the second window elapses
        height.set(3.0 * P + 1.0);
        clock.advance(ms(90));
        let update = engine.poll(&height).expect("recompute after quiet window");

        assert_eq!(update.generation, 1);
        assert_eq!(update.previous_total_pages, 1);
        assert_eq!(update.total_pages, 4);
        assert!(update.page_count_changed());
        assert_eq!(engine.state().page_breaks.len(), 3);

        clock.advance(ms(1_000));
        assert_eq!(engine.poll(&height), None);
    }

    #[test]
    fn test_no_recompute_without_trigger() {
        let (mut engine, clock) = engine();
        clock.advance(ms(500));
        assert_eq!(engine.poll(&500.0_f32), None);
    }

    #[test]
    fn test_unmeasurable_height_yields_single_page() {
        let (mut engine, _) = engine();
        engine.recalculate_now(&(3.0 * P));
        assert_eq!(engine.page_count(), 3);

        let update = engine.recalculate_now(&None::<f32>).unwrap();
        assert_eq!(update.total_pages, 1);
        assert!(engine.state().page_breaks.is_empty());

        engine.recalculate_now(&-40.0_f32);
        assert_eq!(engine.page_count(), 1);
    }

    #[test]
    fn test_shrinking_content_drops_trailing_breaks() {
        let (mut engine, clock) = engine();
        engine.recalculate_now(&(4.5 * P));
        assert_eq!(engine.state().page_breaks.len(), 4);

        engine.notify(ChangeSource::Resize);
        clock.advance(ms(150));
        let update = engine.poll(&(1.2 * P)).unwrap();

        assert_eq!(update.previous_total_pages, 5);
        assert_eq!(update.total_pages, 2);
        assert_eq!(engine.state().page_breaks.len(), 1);
        assert_eq!(engine.state().page_breaks[0].height_from_top, P);
    }

    #[test]
    fn test_recalculate_now_cancels_pending() {
        let (mut engine, clock) = engine();
        engine.notify(ChangeSource::Content);
        assert!(engine.is_pending());

        engine.recalculate_now(&10.0_f32);
        assert!(!engine.is_pending());

        clock.advance(ms(200));
        assert_eq!(engine.poll(&10.0_f32), None);
    }

    #[test]
    fn test_teardown_cancels_and_ignores_triggers() {
        let (mut engine, clock) = engine();
        engine.notify(ChangeSource::Content);
        engine.teardown();

        assert!(!engine.is_pending());
        assert!(!engine.notify(ChangeSource::Content));
        clock.advance(ms(500));
        assert_eq!(engine.poll(&(2.0 * P)), None);
        assert_eq!(engine.recalculate_now(&(2.0 * P)), None);
        assert_eq!(engine.page_count(), 1);
    }

    #[test]
    fn test_rejects_geometry_without_content_area() {
        let geometry = PageGeometry::new(&PageSetup {
            margin_in: 6.0,
            ..PageSetup::default()
        });
        let result = PaginationEngine::new(geometry, ms(150), VirtualClock::new());
        assert!(matches!(result, Err(ConfigError::NonPositiveContent { .. })));
    }

    #[test]
    fn test_time_until_due() {
        let (mut engine, clock) = engine();
        assert_eq!(engine.time_until_due(), None);

        engine.notify(ChangeSource::Content);
        clock.advance(ms(50));
        assert_eq!(engine.time_until_due(), Some(ms(100)));
    }
}
