//! Random access over a trace file through a bounded, sliding window.
//!
//! Only `window_size` parsed lines are resident at any time. Lines outside
//! the window are materialized by a background reload that re-scans the file
//! from the beginning and swaps a fresh [`TraceWindow`] snapshot in. At most
//! one reload runs at a time; requests that arrive while one is in flight are
//! dropped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{TraceError, TraceResult};
use super::record::TraceRecord;
use super::source::{FileSource, TraceSource};
use super::window::{TraceWindow, WindowBounds, WindowConfig};

/// Outcome of looking up one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFetch {
    /// Line is resident and parsed.
    Record(Arc<TraceRecord>),
    /// Line is resident but failed to parse.
    Malformed,
    /// Line exists but is not resident; a reload has been requested.
    NotLoaded,
    /// No such line.
    OutOfRange,
}

impl LineFetch {
    pub fn record(&self) -> Option<&Arc<TraceRecord>> {
        match self {
            LineFetch::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Published after every background reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Window loaded at open time; no reload has completed yet.
    Opened(WindowBounds),
    Loaded(WindowBounds),
    Failed(String),
}

/// Result of asking for a window centered on a line.
#[derive(Debug)]
pub enum ReloadRequest {
    /// A reload task was started. Awaiting the handle yields the new bounds.
    Scheduled(JoinHandle<TraceResult<WindowBounds>>),
    /// The requested window is already resident.
    Unchanged,
    /// Another reload is in flight; this request was dropped.
    Busy,
}

/// Cumulative counters since open.
///
/// Line counters accumulate per scan. Windows overlap between reloads, so a
/// line covered by several reloads is counted once for each of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines_parsed: u64,
    pub lines_malformed: u64,
    pub reloads_completed: u64,
    pub reloads_dropped: u64,
}

struct NavState {
    window: Arc<TraceWindow>,
    cursor: usize,
}

struct Shared {
    source: Box<dyn TraceSource>,
    runtime: Handle,
    total: usize,
    config: WindowConfig,
    state: Mutex<NavState>,
    reloading: AtomicBool,
    events: watch::Sender<ReloadEvent>,
    lines_parsed: AtomicU64,
    lines_malformed: AtomicU64,
    reloads_completed: AtomicU64,
    reloads_dropped: AtomicU64,
}

/// Releases the single-flight flag when dropped.
struct ReloadGuard {
    shared: Arc<Shared>,
}

impl Drop for ReloadGuard {
    fn drop(&mut self) {
        self.shared.reloading.store(false, Ordering::Release);
    }
}

impl Shared {
    fn try_begin_reload(self: &Arc<Self>) -> Option<ReloadGuard> {
        self.reloading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReloadGuard {
                shared: Arc::clone(self),
            })
    }

    fn record_scan(&self, window: &TraceWindow) {
        self.lines_parsed
            .fetch_add(window.parsed_count() as u64, Ordering::Relaxed);
        self.lines_malformed
            .fetch_add(window.malformed_count() as u64, Ordering::Relaxed);
    }

    fn request_reload(self: &Arc<Self>, center: usize) -> ReloadRequest {
        if self.total == 0 {
            return ReloadRequest::Unchanged;
        }

        let bounds = WindowBounds::centered(center, self.config.window_size, self.total);
        let (resident, origin) = {
            let state = self.state.lock();
            (state.window.bounds(), state.cursor)
        };
        if bounds == resident {
            return ReloadRequest::Unchanged;
        }

        let Some(guard) = self.try_begin_reload() else {
            self.reloads_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(center, "Reload already in flight, dropping request");
            return ReloadRequest::Busy;
        };

        debug!(center, start = bounds.start, end = bounds.end, "Scheduling trace window reload");
        let task_shared = Arc::clone(self);
        let handle = self
            .runtime
            .spawn_blocking(move || task_shared.run_reload(guard, center, origin, bounds));
        ReloadRequest::Scheduled(handle)
    }

    fn run_reload(
        self: &Arc<Self>,
        guard: ReloadGuard,
        center: usize,
        origin: usize,
        bounds: WindowBounds,
    ) -> TraceResult<WindowBounds> {
        let started = Instant::now();
        let result = TraceWindow::load(self.source.as_ref(), bounds).map(Arc::new);

        let mut follow_up = None;
        let event = match &result {
            Ok(window) => {
                self.record_scan(window);
                follow_up = self.install(Arc::clone(window), center, origin);
                self.reloads_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    start = window.bounds().start,
                    end = window.bounds().end,
                    malformed = window.malformed_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Trace window reloaded",
                );
                ReloadEvent::Loaded(window.bounds())
            }
            Err(err) => {
                warn!(
                    path = %self.source.path().display(),
                    error = %err,
                    "Trace window reload failed",
                );
                ReloadEvent::Failed(err.to_string())
            }
        };

        // Waiters retry on notification, so the flag must be clear first.
        drop(guard);
        if let Some(cursor) = follow_up {
            self.request_reload(cursor);
        }
        self.events.send_replace(event);

        result.map(|window| window.bounds())
    }

    /// Swap `window` in.
    ///
    /// `origin` is the cursor when the reload was scheduled. A cursor that
    /// navigation moved since then is kept and returned so it can get a
    /// window of its own. An unmoved cursor is only repositioned when it was
    /// the requested center and the window came back clamped away from it.
    fn install(&self, window: Arc<TraceWindow>, center: usize, origin: usize) -> Option<usize> {
        let bounds = window.bounds();
        let mut state = self.state.lock();
        state.window = window;
        if bounds.contains(state.cursor) {
            return None;
        }
        if state.cursor != origin {
            debug!(
                cursor = state.cursor,
                origin, "Cursor moved during reload, keeping it"
            );
            return Some(state.cursor);
        }
        if state.cursor == center && !bounds.is_empty() {
            let cursor = bounds.midpoint();
            debug!(
                from = state.cursor,
                to = cursor,
                "Cursor outside clamped window, moving to midpoint"
            );
            state.cursor = cursor;
        }
        None
    }
}

/// Windowed random access over one trace file.
pub struct WindowedTraceStore {
    shared: Arc<Shared>,
}

impl WindowedTraceStore {
    /// Open a trace file using the ambient Tokio runtime for reloads.
    pub fn open(path: impl Into<PathBuf>, config: WindowConfig) -> TraceResult<Self> {
        let runtime = Handle::try_current()?;
        Self::open_with_handle(path, config, runtime)
    }

    pub fn open_with_handle(
        path: impl Into<PathBuf>,
        config: WindowConfig,
        runtime: Handle,
    ) -> TraceResult<Self> {
        Self::from_source(FileSource::new(path), config, runtime)
    }

    /// Count the lines of `source` and load the window around line 0.
    pub fn from_source(
        source: impl TraceSource,
        config: WindowConfig,
        runtime: Handle,
    ) -> TraceResult<Self> {
        config.validate()?;

        let total = source.count_lines()?;
        let bounds = WindowBounds::centered(0, config.window_size, total);
        let window = TraceWindow::load(&source, bounds)?;

        info!(
            path = %source.path().display(),
            total_lines = total,
            window_start = window.bounds().start,
            window_end = window.bounds().end,
            malformed = window.malformed_count(),
            "Opened trace",
        );

        let (events, _) = watch::channel(ReloadEvent::Opened(window.bounds()));
        let shared = Arc::new(Shared {
            source: Box::new(source),
            runtime,
            total,
            config,
            state: Mutex::new(NavState {
                window: Arc::new(window),
                cursor: 0,
            }),
            reloading: AtomicBool::new(false),
            events,
            lines_parsed: AtomicU64::new(0),
            lines_malformed: AtomicU64::new(0),
            reloads_completed: AtomicU64::new(0),
            reloads_dropped: AtomicU64::new(0),
        });
        shared.record_scan(&shared.state.lock().window);

        Ok(Self { shared })
    }

    pub fn path(&self) -> &Path {
        self.shared.source.path()
    }

    /// Number of lines in the file, fixed at open.
    pub fn total(&self) -> usize {
        self.shared.total
    }

    pub fn config(&self) -> WindowConfig {
        self.shared.config
    }

    pub fn cursor(&self) -> usize {
        self.shared.state.lock().cursor
    }

    /// Current window snapshot. Holding it does not block reloads.
    pub fn window(&self) -> Arc<TraceWindow> {
        Arc::clone(&self.shared.state.lock().window)
    }

    pub fn bounds(&self) -> WindowBounds {
        self.shared.state.lock().window.bounds()
    }

    pub fn is_reloading(&self) -> bool {
        self.shared.reloading.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            lines_parsed: self.shared.lines_parsed.load(Ordering::Relaxed),
            lines_malformed: self.shared.lines_malformed.load(Ordering::Relaxed),
            reloads_completed: self.shared.reloads_completed.load(Ordering::Relaxed),
            reloads_dropped: self.shared.reloads_dropped.load(Ordering::Relaxed),
        }
    }

    /// Notifications for every completed or failed reload.
    pub fn subscribe(&self) -> watch::Receiver<ReloadEvent> {
        self.shared.events.subscribe()
    }

    /// Look up `line`, requesting a reload centered on it when it is in
    /// range but not resident. Never waits for the reload.
    pub fn get_line(&self, line: usize) -> LineFetch {
        match self.lookup(line) {
            Some(fetch) => fetch,
            None => {
                self.request_reload(line);
                LineFetch::NotLoaded
            }
        }
    }

    /// The line under the cursor, see [`get_line`](Self::get_line).
    pub fn current(&self) -> LineFetch {
        self.get_line(self.cursor())
    }

    /// Advance the cursor. Fails on the last line.
    pub fn next(&self) -> bool {
        let (cursor, bounds) = {
            let mut state = self.shared.state.lock();
            if state.cursor + 1 >= self.shared.total {
                return false;
            }
            state.cursor += 1;
            (state.cursor, state.window.bounds())
        };

        if cursor >= bounds.end.saturating_sub(self.shared.config.reload_margin) {
            self.request_reload(cursor);
        }
        true
    }

    /// Move the cursor back. Fails on the first line.
    pub fn prev(&self) -> bool {
        let (cursor, bounds) = {
            let mut state = self.shared.state.lock();
            if state.cursor == 0 || self.shared.total == 0 {
                return false;
            }
            state.cursor -= 1;
            (state.cursor, state.window.bounds())
        };

        if cursor <= bounds.start.saturating_add(self.shared.config.reload_margin) {
            self.request_reload(cursor);
        }
        true
    }

    /// Jump to `line` and request a window around it.
    pub fn go_to(&self, line: usize) -> bool {
        if line >= self.shared.total {
            return false;
        }
        self.shared.state.lock().cursor = line;
        self.request_reload(line);
        true
    }

    /// Ask for a window centered on `center`.
    ///
    /// Returns immediately; a scheduled reload runs on the blocking pool.
    pub fn request_reload(&self, center: usize) -> ReloadRequest {
        self.shared.request_reload(center)
    }

    /// Resolve `line`, waiting for reloads until it is resident.
    ///
    /// Never returns [`LineFetch::NotLoaded`]. There is no internal timeout;
    /// wrap the call in `tokio::time::timeout` when a stalled source matters.
    pub async fn fetch_line(&self, line: usize) -> TraceResult<LineFetch> {
        let mut events = self.subscribe();
        loop {
            if let Some(fetch) = self.lookup(line) {
                return Ok(fetch);
            }

            match self.request_reload(line) {
                ReloadRequest::Scheduled(handle) => {
                    let bounds = handle.await??;
                    // Source shorter than at open.
                    if !bounds.contains(line) {
                        return self.lookup(line).ok_or(TraceError::LineUnavailable(line));
                    }
                }
                ReloadRequest::Busy => {
                    events
                        .changed()
                        .await
                        .map_err(|_| TraceError::ReloadFailed("store dropped".to_string()))?;
                    if let ReloadEvent::Failed(message) = &*events.borrow_and_update() {
                        return Err(TraceError::ReloadFailed(message.clone()));
                    }
                }
                ReloadRequest::Unchanged => {
                    return self.lookup(line).ok_or(TraceError::LineUnavailable(line));
                }
            }
        }
    }

    /// `None` means in range but not resident.
    fn lookup(&self, line: usize) -> Option<LineFetch> {
        if line >= self.shared.total {
            return Some(LineFetch::OutOfRange);
        }
        let window = self.window();
        window.get(line).map(|entry| match entry {
            Some(record) => LineFetch::Record(Arc::clone(record)),
            None => LineFetch::Malformed,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::trace::record::tests::sample_line;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn trace_file(lines: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn well_formed(count: u32) -> Vec<String> {
        (0..count).map(|step| sample_line(step, step as u64)).collect()
    }

    fn config(window_size: usize, reload_margin: usize) -> WindowConfig {
        WindowConfig {
            window_size,
            reload_margin,
        }
    }

    async fn settle(store: &WindowedTraceStore) {
        for _ in 0..500 {
            if !store.is_reloading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("reload did not finish"); // LCOV_EXCL_LINE
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open__missing_file__then_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = WindowedTraceStore::open(dir.path().join("code.log"), config(10, 2));
        assert!(matches!(result, Err(TraceError::Io { .. })));
    }

    #[test]
    fn open__outside_runtime__then_runtime_error() {
        let file = trace_file(&well_formed(3));
        let result = WindowedTraceStore::open(file.path(), config(10, 2));
        assert!(matches!(result, Err(TraceError::Runtime(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open__zero_window_size__then_invalid_config() {
        let file = trace_file(&well_formed(3));
        let result = WindowedTraceStore::open(file.path(), config(0, 0));
        assert!(matches!(result, Err(TraceError::InvalidConfig(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open__larger_than_window__then_initial_window_at_start() {
        let file = trace_file(&well_formed(50));
        let store = WindowedTraceStore::open(file.path(), config(20, 3)).unwrap();

        assert_eq!(store.total(), 50);
        assert_eq!(store.bounds(), WindowBounds { start: 0, end: 20 });
        assert_eq!(store.cursor(), 0);
        assert_eq!(store.current().record().unwrap().step, 0);
        assert_eq!(store.stats().lines_parsed, 20);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open__empty_file__then_navigation_fails() {
        let file = trace_file(&[]);
        let store = WindowedTraceStore::open(file.path(), config(20, 3)).unwrap();

        assert_eq!(store.total(), 0);
        assert!(store.bounds().is_empty());
        assert!(!store.next());
        assert!(!store.prev());
        assert!(!store.go_to(0));
        assert_eq!(store.current(), LineFetch::OutOfRange);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_line__malformed_in_window__then_distinct_from_not_loaded() {
        let mut lines = well_formed(40);
        lines[3] = "garbage".to_string();
        let file = trace_file(&lines);
        let store = WindowedTraceStore::open(file.path(), config(10, 2)).unwrap();

        assert_eq!(store.get_line(3), LineFetch::Malformed);
        assert_eq!(store.get_line(35), LineFetch::NotLoaded);
        assert_eq!(store.get_line(40), LineFetch::OutOfRange);
        assert_eq!(store.stats().lines_malformed, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_line__outside_window__then_reload_eventually_materializes() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(10, 2)).unwrap();

        let mut found = None;
        for _ in 0..500 {
            if let LineFetch::Record(record) = store.get_line(77) {
                found = Some(record);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(found.expect("line 77 never loaded").step, 77);
        assert!(store.bounds().contains(77));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn next__at_last_line__then_false_and_cursor_unchanged() {
        let file = trace_file(&well_formed(3));
        let store = WindowedTraceStore::open(file.path(), config(10, 2)).unwrap();

        assert!(store.next());
        assert!(store.next());
        assert!(!store.next());
        assert_eq!(store.cursor(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prev__at_first_line__then_false_and_cursor_unchanged() {
        let file = trace_file(&well_formed(3));
        let store = WindowedTraceStore::open(file.path(), config(10, 2)).unwrap();

        assert!(!store.prev());
        assert_eq!(store.cursor(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn go_to__out_of_range__then_false_and_cursor_unchanged() {
        let file = trace_file(&well_formed(30));
        let store = WindowedTraceStore::open(file.path(), config(10, 2)).unwrap();

        assert!(store.go_to(5));
        assert!(!store.go_to(30));
        assert!(!store.go_to(usize::MAX));
        assert_eq!(store.cursor(), 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn go_to__far_line__then_fetch_line_resolves_record() {
        let file = trace_file(&well_formed(200));
        let store = WindowedTraceStore::open(file.path(), config(20, 3)).unwrap();

        assert!(store.go_to(150));
        let fetched = tokio::time::timeout(Duration::from_secs(5), store.fetch_line(150))
            .await
            .expect("fetch timed out")
            .unwrap();

        assert_eq!(fetched.record().unwrap().step, 150);
        assert_eq!(store.cursor(), 150);
        assert_eq!(store.bounds(), WindowBounds { start: 140, end: 160 });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn next__near_window_edge__then_prefetches_next_window() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();

        // Window is [0, 20); reaching line 15 enters the margin.
        for _ in 0..15 {
            assert!(store.next());
        }
        settle(&store).await;

        assert_eq!(store.bounds(), WindowBounds { start: 5, end: 25 });
        assert_eq!(store.stats().reloads_completed, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prev__near_window_start__then_prefetches_previous_window() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();

        assert!(store.go_to(60));
        store.fetch_line(60).await.unwrap();
        assert_eq!(store.bounds(), WindowBounds { start: 50, end: 70 });

        for _ in 0..5 {
            assert!(store.prev());
        }
        settle(&store).await;

        assert_eq!(store.cursor(), 55);
        assert_eq!(store.bounds(), WindowBounds { start: 45, end: 65 });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_reload__same_window__then_unchanged() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();

        assert!(matches!(store.request_reload(3), ReloadRequest::Unchanged));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_reload__scheduled__then_handle_yields_bounds_and_notifies() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();
        let mut events = store.subscribe();

        let ReloadRequest::Scheduled(handle) = store.request_reload(90) else {
            panic!("expected scheduled reload"); // LCOV_EXCL_LINE
        };
        let bounds = handle.await.unwrap().unwrap();

        assert_eq!(bounds, WindowBounds { start: 80, end: 100 });
        events.changed().await.unwrap();
        assert_eq!(*events.borrow(), ReloadEvent::Loaded(bounds));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_reload__far_from_unmoved_cursor__then_cursor_kept() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();

        let ReloadRequest::Scheduled(handle) = store.request_reload(50) else {
            panic!("expected scheduled reload"); // LCOV_EXCL_LINE
        };
        handle.await.unwrap().unwrap();
        settle(&store).await;

        assert_eq!(store.bounds(), WindowBounds { start: 40, end: 60 });
        assert_eq!(store.cursor(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn go_to__window_clamped_by_shorter_file__then_cursor_moved_to_midpoint() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();
        std::fs::write(file.path(), well_formed(75).join("\n")).unwrap();

        assert!(store.go_to(80));
        settle(&store).await;

        assert_eq!(store.bounds(), WindowBounds { start: 70, end: 75 });
        assert_eq!(store.cursor(), 72);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prev__huge_reload_margin__then_steps_back_without_overflow() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, usize::MAX)).unwrap();

        assert!(store.go_to(60));
        store.fetch_line(60).await.unwrap();
        assert_eq!(store.bounds(), WindowBounds { start: 50, end: 70 });

        assert!(store.prev());
        assert_eq!(store.cursor(), 59);
        assert!(store.next());
        assert_eq!(store.cursor(), 60);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reload__file_removed__then_failed_event_and_window_kept() {
        let file = trace_file(&well_formed(100));
        let path = file.path().to_path_buf();
        let store = WindowedTraceStore::open(&path, config(20, 5)).unwrap();
        let mut events = store.subscribe();
        drop(file);

        let ReloadRequest::Scheduled(handle) = store.request_reload(70) else {
            panic!("expected scheduled reload"); // LCOV_EXCL_LINE
        };
        let result = handle.await.unwrap();

        assert!(matches!(result, Err(TraceError::Io { .. })));
        events.changed().await.unwrap();
        assert!(matches!(*events.borrow(), ReloadEvent::Failed(_)));
        assert_eq!(store.bounds(), WindowBounds { start: 0, end: 20 });
        assert!(!store.is_reloading());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_line__file_truncated_after_open__then_line_unavailable() {
        let file = trace_file(&well_formed(100));
        let store = WindowedTraceStore::open(file.path(), config(20, 5)).unwrap();
        std::fs::write(file.path(), well_formed(30).join("\n")).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), store.fetch_line(80))
            .await
            .expect("fetch should not spin");

        assert!(matches!(result, Err(TraceError::LineUnavailable(80))));
        assert_eq!(store.total(), 100);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open__file_source__then_reports_path_and_config() {
        let file = trace_file(&well_formed(5));
        let store = WindowedTraceStore::open(file.path(), config(4, 1)).unwrap();

        assert_eq!(store.path(), file.path());
        assert_eq!(store.config(), config(4, 1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stats__malformed_line_in_overlapping_reloads__then_counted_per_scan() {
        let mut lines = well_formed(40);
        lines[12] = "garbage".to_string();
        let file = trace_file(&lines);
        let store = WindowedTraceStore::open(file.path(), config(20, 2)).unwrap();
        assert_eq!(store.stats().lines_malformed, 1);

        let ReloadRequest::Scheduled(handle) = store.request_reload(15) else {
            panic!("expected scheduled reload"); // LCOV_EXCL_LINE
        };
        handle.await.unwrap().unwrap();

        assert_eq!(store.bounds(), WindowBounds { start: 5, end: 25 });
        assert_eq!(store.stats().lines_malformed, 2);
        assert_eq!(store.stats().lines_parsed, 19 + 19);
    }
}
