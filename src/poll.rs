// src/poll.rs

use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::{
    display::{DisplayState, Render},
    extract::extract_reading,
    fetch::Source,
    parse::parse_csv,
};

/// Default time between poll cycles.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How one poll cycle ended.
///
/// The poller is idle between cycles and fetching while `poll_once` awaits
/// its source; every outcome puts it back to idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// New values reached the board.
    Updated,
    /// Parsed fine, nothing visible changed.
    Unchanged,
    FetchFailed,
    ParseFailed,
}

/// Drives fetch → parse → extract → render on a fixed interval.
pub struct Poller<S, R> {
    source: S,
    renderer: R,
    state: DisplayState,
    interval: Duration,
}

impl<S: Source, R: Render> Poller<S, R> {
    pub fn new(source: S, renderer: R, interval: Duration) -> Self {
        let state = DisplayState::new(source.mode());
        Self {
            source,
            renderer,
            state,
            interval,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// One full cycle. Failures are logged and leave the board untouched.
    #[instrument(level = "debug", skip(self), fields(mode = self.state.mode))]
    pub async fn poll_once(&mut self) -> Outcome {
        let start = Instant::now();
        let fetched = self.source.fetch().await;

        let text = match fetched {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "fetch failed; keeping current board");
                return Outcome::FetchFailed;
            }
        };
        debug!(bytes = text.len(), elapsed = ?start.elapsed(), "fetched");

        let record = match parse_csv(&text) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "unusable sheet contents; keeping current board");
                return Outcome::ParseFailed;
            }
        };

        let reading = extract_reading(&record);
        if reading.event.is_none() {
            debug!(cell = %record.event, "no number in event cell");
        }
        if reading.heat.is_none() {
            debug!(cell = %record.heat, "no number in heat cell");
        }
        if reading.is_empty() {
            // a fresh time next to old numbers would be misleading
            return Outcome::Unchanged;
        }

        if self.state.apply(reading) {
            info!(
                event = self.state.event.as_deref().unwrap_or("-"),
                heat = self.state.heat.as_deref().unwrap_or("-"),
                "board updated"
            );
            self.renderer.render(&self.state);
            Outcome::Updated
        } else {
            Outcome::Unchanged
        }
    }

    /// Poll forever. The first cycle runs immediately; ticks missed while a
    /// slow fetch is in flight are skipped rather than queued, so cycles never
    /// overlap.
    pub async fn run(&mut self) {
        self.renderer.render(&self.state);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval = ?self.interval, mode = self.state.mode, "polling");

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FetchError,
        fetch::{MockSource, DEMO_CSV},
    };
    use std::{
        collections::VecDeque,
        future::Future,
        sync::{Arc, Mutex},
    };

    /// Renderer that records every frame it was handed.
    #[derive(Clone, Default)]
    struct Frames(Arc<Mutex<Vec<DisplayState>>>);

    impl Frames {
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    impl Render for Frames {
        fn render(&mut self, state: &DisplayState) {
            self.0.lock().unwrap().push(state.clone());
        }
    }

    /// Source scripted with a queue of results; `None` simulates a failure.
    struct Scripted(Mutex<VecDeque<Option<&'static str>>>);

    impl Scripted {
        fn new(items: &[Option<&'static str>]) -> Self {
            Self(Mutex::new(items.iter().copied().collect()))
        }
    }

    impl Source for Scripted {
        fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
            let next = self.0.lock().unwrap().pop_front().flatten();
            async move {
                match next {
                    Some(text) => Ok(text.to_string()),
                    None => Err(FetchError::Status {
                        url: "http://sheet.invalid/".into(),
                        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    }),
                }
            }
        }

        fn mode(&self) -> &'static str {
            "Live"
        }
    }

    fn values(p: &Poller<impl Source, impl Render>) -> (Option<&str>, Option<&str>) {
        (p.state().event.as_deref(), p.state().heat.as_deref())
    }

    #[tokio::test]
    async fn offline_demo_populates_on_first_cycle() {
        let mut p = Poller::new(MockSource::demo(), Frames::default(), POLL_INTERVAL);
        assert_eq!(p.poll_once().await, Outcome::Updated);
        assert_eq!(values(&p), (Some("99"), Some("10")));
        assert_eq!(p.state().mode, "Offline Demo");
        assert!(DEMO_CSV.starts_with("Event,Heat,Time"));
    }

    #[tokio::test]
    async fn embedded_label_and_bare_numbers() {
        let src = MockSource::new("Event,Heat,Time\nWomen's 50m Free Event 45,Heat 7,\n");
        let handle = src.handle();
        let mut p = Poller::new(src, Frames::default(), POLL_INTERVAL);

        p.poll_once().await;
        assert_eq!(values(&p), (Some("45"), Some("7")));

        handle.set("Event,Heat,Time\n44,11,2024-01-20T10:00:00.000Z");
        p.poll_once().await;
        assert_eq!(values(&p), (Some("44"), Some("11")));
    }

    #[tokio::test]
    async fn every_reference_format_through_the_mock_hook() {
        let src = MockSource::new("");
        let handle = src.handle();
        let mut p = Poller::new(src, Frames::default(), POLL_INTERVAL);

        let cases = [
            ("event 12,heat 3,2024-01-20T10:00:00.000Z", "12", "3"),
            ("Women's 50m Free Event 45,Heat 7,2024-01-20T10:00:00.000Z", "45", "7"),
            ("44,11,2024-01-20T10:00:00.000Z", "44", "11"),
            ("Finals Event 101,Heat 2,2024-01-20T10:00:00.000Z", "101", "2"),
        ];
        for (row, event, heat) in cases {
            handle.set(format!("Event,Heat,Time\n{row}"));
            p.poll_once().await;
            assert_eq!(values(&p), (Some(event), Some(heat)), "row {row:?}");
        }
    }

    #[tokio::test]
    async fn reordered_header() {
        let src = MockSource::new("Heat,Event,Time\nHeat 4,Event 20,\n");
        let mut p = Poller::new(src, Frames::default(), POLL_INTERVAL);
        p.poll_once().await;
        assert_eq!(values(&p), (Some("20"), Some("4")));
    }

    #[tokio::test]
    async fn header_only_leaves_state_alone() {
        let src = MockSource::new("Event,Heat,Time\n8,2,\n");
        let handle = src.handle();
        let frames = Frames::default();
        let mut p = Poller::new(src, frames.clone(), POLL_INTERVAL);
        p.poll_once().await;

        handle.set("Event,Heat,Time\n");
        assert_eq!(p.poll_once().await, Outcome::ParseFailed);
        assert_eq!(values(&p), (Some("8"), Some("2")));
        assert_eq!(frames.count(), 1);
    }

    #[tokio::test]
    async fn failures_keep_stale_values_and_recover() {
        let src = Scripted::new(&[
            Some("Event,Heat\n3,1"),
            None,
            Some("garbage"),
            Some("Event,Heat\nEvent,Heat 2"),
            Some("Event,Heat\n4,1"),
        ]);
        let frames = Frames::default();
        let mut p = Poller::new(src, frames.clone(), POLL_INTERVAL);

        assert_eq!(p.poll_once().await, Outcome::Updated);
        assert_eq!(p.poll_once().await, Outcome::FetchFailed);
        assert_eq!(values(&p), (Some("3"), Some("1")));

        assert_eq!(p.poll_once().await, Outcome::ParseFailed);
        assert_eq!(values(&p), (Some("3"), Some("1")));

        // event cell has no digits, heat still moves on
        assert_eq!(p.poll_once().await, Outcome::Updated);
        assert_eq!(values(&p), (Some("3"), Some("2")));

        assert_eq!(p.poll_once().await, Outcome::Updated);
        assert_eq!(values(&p), (Some("4"), Some("1")));
        assert_eq!(frames.count(), 3);
    }

    #[tokio::test]
    async fn unchanged_sheet_does_not_redraw() {
        let frames = Frames::default();
        let mut p = Poller::new(MockSource::demo(), frames.clone(), POLL_INTERVAL);
        p.poll_once().await;
        assert_eq!(p.poll_once().await, Outcome::Unchanged);
        assert_eq!(frames.count(), 1);
    }

    #[tokio::test]
    async fn row_without_numbers_does_not_touch_the_board() {
        let src = MockSource::new("Event,Heat,Time\n3,1,a\n");
        let handle = src.handle();
        let frames = Frames::default();
        let mut p = Poller::new(src, frames.clone(), POLL_INTERVAL);
        assert_eq!(p.poll_once().await, Outcome::Updated);

        handle.set("Event,Heat,Time\n--,--,later\n");
        assert_eq!(p.poll_once().await, Outcome::Unchanged);
        assert_eq!(values(&p), (Some("3"), Some("1")));
        assert_eq!(p.state().updated.as_deref(), Some("a"));
        assert_eq!(frames.count(), 1);
    }

    #[tokio::test]
    async fn quoted_comma_does_not_shift_columns() {
        let src = MockSource::new("Event,Heat,Time\n\"Women's 50m Free, Event 45\",Heat 7,x\n");
        let mut p = Poller::new(src, Frames::default(), POLL_INTERVAL);
        p.poll_once().await;
        assert_eq!(values(&p), (Some("45"), Some("7")));
    }

    #[tokio::test(start_paused = true)]
    async fn run_paints_immediately_then_follows_interval() {
        let src = MockSource::demo();
        let handle = src.handle();
        let frames = Frames::default();
        let mut p = Poller::new(src, frames.clone(), Duration::from_secs(10));

        let task = tokio::spawn(async move { p.run().await });

        // initial blank frame plus the immediate first cycle
        tokio::time::sleep(Duration::from_millis(1)).await;
        {
            let seen = frames.0.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[1].event.as_deref(), Some("99"));
            assert_eq!(seen[1].heat.as_deref(), Some("10"));
        }

        handle.set("Event,Heat\n100,5");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(frames.count(), 2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        {
            let seen = frames.0.lock().unwrap();
            assert_eq!(seen.len(), 3);
            assert_eq!(seen[2].event.as_deref(), Some("100"));
        }

        task.abort();
    }
}
