//! # Runtime
//!
//! Tokio runtime presets shared by the WellnessHub binaries.
//!
//! The `#[whub_runtime::main]` attribute turns an `async fn main` into a plain `main` that
//! builds one of the presets below and blocks on the body.
//!
//! ```rust,ignore
//! #[whub_runtime::main(high_performance)]
//! async fn main() -> whub_runtime::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use whub_derive::main;

use anyhow::Context;
use std::{num::NonZero, sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Environment variable that pins the number of worker threads.
pub const WORKER_THREADS_ENV: &str = "TOKIO_WORKER_THREADS";

const FALLBACK_WORKERS: usize = 4;
const MAX_WORKERS: usize = 512;
const MIN_STACK: usize = 1024 * 1024;
const MAX_STACK: usize = 16 * 1024 * 1024;
const DEFAULT_THREAD_NAME: &str = "whub-worker";

static DETECTED_WORKERS: OnceLock<usize> = OnceLock::new();

fn detected_workers() -> usize {
    *DETECTED_WORKERS.get_or_init(|| {
        std::env::var(WORKER_THREADS_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|n| (1..=MAX_WORKERS).contains(n))
            .unwrap_or_else(|| {
                available_parallelism().map(NonZero::get).unwrap_or(FALLBACK_WORKERS)
            })
    })
}

/// Settings for the multi-threaded Tokio scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detected_workers(),
            stack_size: 3 * 1024 * 1024,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: Duration::from_secs(60),
        }
    }
}

impl RuntimeConfig {
    /// Preset used by the API server.
    #[must_use]
    pub fn high_performance() -> Self {
        Self {
            stack_size: 4 * 1024 * 1024,
            thread_name: "whub-api".to_owned(),
            thread_keep_alive: Duration::from_secs(300),
            ..Self::default()
        }
    }

    /// Preset for tooling and tests where memory matters more than throughput.
    #[must_use]
    pub fn memory_efficient() -> Self {
        Self {
            worker_threads: (detected_workers() / 2).max(1),
            stack_size: 2 * 1024 * 1024,
            thread_name: "whub-lite".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKERS);
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes.clamp(MIN_STACK, MAX_STACK);
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.thread_name = name;
        }
        self
    }

    /// Clamps every knob into its supported range.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let thread_name = if self.thread_name.trim().is_empty() {
            DEFAULT_THREAD_NAME.to_owned()
        } else {
            self.thread_name.clone()
        };
        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKERS),
            stack_size: self.stack_size.clamp(MIN_STACK, MAX_STACK),
            thread_name,
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Builds a multi-threaded runtime with I/O and timers enabled.
///
/// # Errors
///
/// Fails when the OS refuses to spawn the worker threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(
        workers = config.worker_threads,
        stack = config.stack_size,
        name = %config.thread_name,
        "Building tokio runtime"
    );

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize the tokio runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_threads_are_clamped() {
        assert_eq!(RuntimeConfig::default().with_worker_threads(0).worker_threads, 1);
        let clamped = RuntimeConfig::default().with_worker_threads(10_000);
        assert_eq!(clamped.worker_threads, MAX_WORKERS);
    }

    #[test]
    fn stack_size_is_clamped() {
        assert_eq!(RuntimeConfig::default().with_stack_size(1).stack_size, MIN_STACK);
        assert_eq!(RuntimeConfig::default().with_stack_size(usize::MAX).stack_size, MAX_STACK);
    }

    #[test]
    fn blank_thread_name_is_ignored() {
        let config = RuntimeConfig::high_performance().with_thread_name("   ");
        assert_eq!(config.thread_name, "whub-api");
    }

    #[test]
    fn normalized_repairs_hand_built_config() {
        let raw = RuntimeConfig {
            worker_threads: 0,
            stack_size: 0,
            thread_name: String::new(),
            thread_keep_alive: Duration::from_secs(1),
        };
        let fixed = raw.normalized();
        assert_eq!(fixed.worker_threads, 1);
        assert_eq!(fixed.stack_size, MIN_STACK);
        assert_eq!(fixed.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn memory_efficient_uses_at_least_one_worker() {
        assert!(RuntimeConfig::memory_efficient().worker_threads >= 1);
    }

    #[test]
    fn built_runtime_executes_futures() {
        let config = RuntimeConfig::memory_efficient().with_worker_threads(1);
        let rt = build_runtime_with_config(&config).unwrap();
        assert_eq!(rt.block_on(async { 21 * 2 }), 42);
    }
}
