// File: behaviour-testing/src/logging/mod.rs
//
// Logging for behaviour tests.
//
// One fern dispatch is installed as the process-wide `log` logger, once.
// Every test instance then asks for its own TestLogger: a uniquely named
// route with its own threshold, layout and target. The dispatch forwards each
// record to the route matching its target. Records from any other target
// (the subject's own `log::warn!` calls, for instance) go to the sink of the
// instance whose hooks are being polled on the current thread, and to a
// stderr chain at the globally configured level when no instance is running.

/// Message layouts
pub mod layout;
/// Per-instance logger handle
pub mod logger;
/// Output targets
pub mod target;

pub use layout::Layout;
pub use logger::TestLogger;
pub use target::{LoggingTarget, MemoryLog};

use crate::config::{self, LogLevel};
use crate::error::LoggingError;
use lazy_static::lazy_static;
use log::{LevelFilter, Metadata, Record};
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use target::Sink;

lazy_static! {
    static ref ROUTES: RwLock<HashMap<String, Arc<Sink>>> = RwLock::new(HashMap::new());
    static ref DISPATCH_APPLIED: bool = apply_dispatch();
}

static INSTALLED: AtomicBool = AtomicBool::new(false);
static NEXT_LOGGER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Sink of the instance whose hooks are being polled on this thread
    static CURRENT: RefCell<Option<Arc<Sink>>> = const { RefCell::new(None) };
}

fn current_sink() -> Option<Arc<Sink>> {
    CURRENT.try_with(|current| current.borrow().clone()).ok().flatten()
}

fn has_destination(metadata: &Metadata) -> bool {
    ROUTES.read().contains_key(metadata.target()) || current_sink().is_some()
}

fn route(record: &Record) {
    let sink = ROUTES
        .read()
        .get(record.target())
        .cloned()
        .or_else(current_sink);
    if let Some(sink) = sink {
        sink.write(record);
    }
}

fn apply_dispatch() -> bool {
    let routed = fern::Dispatch::new()
        .filter(has_destination)
        .chain(fern::Output::call(route));

    let fallback = fern::Dispatch::new()
        .level(config::global().log_level.to_level_filter())
        .filter(|metadata| !has_destination(metadata))
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let applied = fern::Dispatch::new()
        .level(LevelFilter::Trace)
        .chain(routed)
        .chain(fallback)
        .apply()
        .is_ok();
    INSTALLED.store(applied, Ordering::SeqCst);
    applied
}

/// Install the routing dispatch as the global `log` logger
///
/// Idempotent: only the first call touches global state. Returns whether the
/// dispatch is the active logger; `false` means another logger was installed
/// first, in which case test loggers write straight to their own targets.
pub fn install() -> bool {
    *DISPATCH_APPLIED
}

/// Whether [`install`] succeeded
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

/// Request a logger handle
///
/// `name` is made unique by appending `#<id>`, so two instances of the same
/// test type never share a route.
///
/// # Errors
///
/// Returns an error if the target cannot be opened (file targets only).
pub fn configure(
    name: &str,
    target: LoggingTarget,
    threshold: LogLevel,
    layout: Layout,
) -> Result<TestLogger, LoggingError> {
    let routed = install();
    let sink = Arc::new(Sink::open(&target, threshold.to_level_filter(), layout)?);
    let name = format!("{}#{}", name, NEXT_LOGGER_ID.fetch_add(1, Ordering::Relaxed));

    if routed {
        ROUTES.write().insert(name.clone(), sink.clone());
    }
    Ok(TestLogger::new(name, target, threshold, sink, routed))
}

pub(crate) fn unregister(name: &str) {
    ROUTES.write().remove(name);
}

/// Sends records that have no route of their own to a test logger's sink,
/// on this thread, until dropped
pub(crate) struct Scope {
    previous: Option<Arc<Sink>>,
}

impl Scope {
    pub(crate) fn enter(sink: Option<Arc<Sink>>) -> Self {
        let previous = CURRENT
            .try_with(|current| current.replace(sink))
            .ok()
            .flatten();
        Self { previous }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = CURRENT.try_with(|current| current.replace(previous));
    }
}

/// Poll `future` inside a [`Scope`] for `sink`
///
/// The scope is entered on every poll, so it follows the future across
/// worker threads.
pub(crate) fn in_scope<F>(sink: Option<Arc<Sink>>, future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let mut future = Box::pin(future);
    futures::future::poll_fn(move |cx| {
        let _scope = Scope::enter(sink.clone());
        future.as_mut().poll(cx)
    })
}

#[cfg(test)]
pub(crate) fn is_routed(name: &str) -> bool {
    ROUTES.read().contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_idempotent() {
        let first = install();
        assert_eq!(install(), first);
        assert_eq!(is_installed(), first);
    }

    #[test]
    fn test_configure_names_are_unique() {
        let a = configure(
            "dup",
            LoggingTarget::Console,
            LogLevel::Warn,
            Layout::default(),
        )
        .unwrap();
        let b = configure(
            "dup",
            LoggingTarget::Console,
            LogLevel::Warn,
            Layout::default(),
        )
        .unwrap();
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("dup#"));
    }

    #[test]
    fn test_records_route_by_target() {
        let (target, memory) = LoggingTarget::memory();
        let logger = configure("routing", target, LogLevel::Info, Layout::default()).unwrap();

        log::info!(target: logger.name(), "through the facade");
        log::info!(target: "someone-else", "not for this logger");

        if is_installed() {
            assert_eq!(memory.lines(), vec!["through the facade".to_string()]);
        }
    }

    #[test]
    fn test_drop_unregisters_route() {
        let (target, _memory) = LoggingTarget::memory();
        let logger = configure("dropped", target, LogLevel::Info, Layout::default()).unwrap();
        let name = logger.name().to_string();
        assert_eq!(is_routed(&name), is_installed());
        drop(logger);
        assert!(!is_routed(&name));
    }

    #[test]
    fn test_scope_catches_records_without_a_route() {
        let (outer_target, outer) = LoggingTarget::memory();
        let (inner_target, inner) = LoggingTarget::memory();
        let outer_log = configure("outer", outer_target, LogLevel::Debug, Layout::default()).unwrap();
        let inner_log = configure("inner", inner_target, LogLevel::Warn, Layout::default()).unwrap();

        {
            let _outer = Scope::enter(outer_log.sink());
            log::debug!(target: "subject", "outer debug");
            {
                let _inner = Scope::enter(inner_log.sink());
                log::debug!(target: "subject", "inner debug");
                log::warn!(target: "subject", "inner warn");
            }
            log::warn!(target: "subject", "outer again");
        }
        log::warn!(target: "subject", "nobody listening");

        if is_installed() {
            assert_eq!(outer.lines(), vec!["outer debug", "outer again"]);
            assert_eq!(inner.lines(), vec!["inner warn"]);
        }
    }

    #[test]
    fn test_in_scope_applies_on_every_poll() {
        let (target, memory) = LoggingTarget::memory();
        let logger = configure("polled", target, LogLevel::Info, Layout::default()).unwrap();

        let mut first_poll = true;
        let future = futures::future::poll_fn(|cx| {
            log::info!(target: "subject", "poll");
            if std::mem::take(&mut first_poll) {
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            } else {
                std::task::Poll::Ready(())
            }
        });
        futures::executor::block_on(in_scope(logger.sink(), future));
        log::info!(target: "subject", "after");

        if is_installed() {
            assert_eq!(memory.lines(), vec!["poll", "poll"]);
        }
    }
}
