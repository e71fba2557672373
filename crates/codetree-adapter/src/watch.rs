//! Page change detection
//!
//! ```text
//! pjax container present ──► childList mutation ──► LocationChanged
//!
//! otherwise: poll (href, hash) every 200 ms
//!            first observation ignored
//!            change ──► wait 300 ms ──► LocationChanged
//!
//! body class mutation touching `split-diff` ──► LayoutChanged
//! ```

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Polling period of the location fallback
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Delay before reporting a polled change, lets the new DOM settle
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Class toggled on the body when a diff switches to split view
pub const SPLIT_DIFF_CLASS: &str = "split-diff";

/// Events the sidebar reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEvent {
    /// The page moved, the repo context must be re-resolved
    LocationChanged,
    /// Page width changed, the layout must be recomputed
    LayoutChanged,
    /// A pjax request started
    RequestStarted,
    /// A pjax request finished
    RequestEnded,
}

impl PageEvent {
    /// Map a jquery-pjax document event name
    pub fn from_pjax(name: &str) -> Option<Self> {
        match name {
            "pjax:send" => Some(PageEvent::RequestStarted),
            "pjax:end" => Some(PageEvent::RequestEnded),
            _ => None,
        }
    }
}

/// How an adapter wants location changes detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageWatch {
    /// Observe child list mutations of this container
    PjaxContainer { selector: String },
    /// Poll the location
    Poll { interval: Duration, settle: Duration },
}

impl PageWatch {
    pub fn poll() -> Self {
        PageWatch::Poll {
            interval: POLL_INTERVAL,
            settle: SETTLE_DELAY,
        }
    }
}

/// Body class mutation to layout event
pub fn class_mutation_event(old_class: &str, new_class: &str) -> Option<PageEvent> {
    if old_class.contains(SPLIT_DIFF_CLASS) || new_class.contains(SPLIT_DIFF_CLASS) {
        Some(PageEvent::LayoutChanged)
    } else {
        None
    }
}

/// Remembers the last seen location
#[derive(Debug, Default)]
pub struct LocationTracker {
    last: Option<(String, String)>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; true when it is a change worth reporting
    ///
    /// The first observation only primes the tracker.
    pub fn observe(&mut self, href: &str, hash: &str) -> bool {
        match &self.last {
            Some((last_href, last_hash)) if last_href == href && last_hash == hash => false,
            previous => {
                let first = previous.is_none();
                self.last = Some((href.to_string(), hash.to_string()));
                !first
            }
        }
    }
}

/// Current `(href, hash)` of the page
pub trait LocationSource: Send + Sync + 'static {
    fn current(&self) -> (String, String);
}

/// Poll `source` until the receiver is dropped
pub fn spawn_location_poller<S: LocationSource>(
    source: S,
    events: UnboundedSender<PageEvent>,
    interval: Duration,
    settle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tracker = LocationTracker::new();
        while !events.is_closed() {
            let (href, hash) = source.current();
            if tracker.observe(&href, &hash) {
                log::debug!("Location changed to {}", href);
                let events = events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(settle).await;
                    let _ = events.send(PageEvent::LocationChanged);
                });
            }
            tokio::time::sleep(interval).await;
        }
        log::debug!("Location poller stopped");
    })
}
