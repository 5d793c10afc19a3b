//! Shared helpers for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use promptstream::GenerateError;
use promptstream::providers::{TokenSource, UpstreamEvent, UpstreamStream};
use promptstream::types::GenerationRequest;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn read_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(relative)).expect("read fixture text")
}

/// What a [`ScriptedSource`] does when opened.
#[derive(Clone)]
enum Script {
    Events(Vec<Result<UpstreamEvent, GenerateError>>),
    /// Emit events, then never finish.
    Hang(Vec<Result<UpstreamEvent, GenerateError>>),
    /// Refuse to construct a stream.
    Fail(GenerateError),
}

/// Token source replaying a fixed event sequence and counting opens.
#[derive(Clone)]
pub struct ScriptedSource {
    script: Script,
    delay: Duration,
    opens: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

/// Sets its flag when the stream holding it is dropped.
struct ReleaseGuard(Arc<AtomicBool>);

impl ReleaseGuard {
    fn hold(&self) {}
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ScriptedSource {
    pub fn new(events: Vec<Result<UpstreamEvent, GenerateError>>) -> Self {
        Self::with_script(Script::Events(events))
    }

    /// Text deltas followed by a normal end.
    pub fn texts(parts: &[&str]) -> Self {
        let mut events: Vec<_> = parts
            .iter()
            .map(|p| Ok(UpstreamEvent::Text(p.to_string())))
            .collect();
        events.push(Ok(UpstreamEvent::End));
        Self::new(events)
    }

    pub fn hanging(events: Vec<Result<UpstreamEvent, GenerateError>>) -> Self {
        Self::with_script(Script::Hang(events))
    }

    pub fn failing(error: GenerateError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            opens: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pause before every event.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared open counter; clone it before handing the source away.
    pub fn opens(&self) -> Arc<AtomicUsize> {
        self.opens.clone()
    }

    /// Flag set once an opened upstream stream has been dropped.
    pub fn released(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }
}

impl TokenSource for ScriptedSource {
    fn open(&self, _request: &GenerationRequest) -> Result<UpstreamStream, GenerateError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay;
        let (events, hang) = match &self.script {
            Script::Events(events) => (events.clone(), false),
            Script::Hang(events) => (events.clone(), true),
            Script::Fail(error) => return Err(error.clone()),
        };

        let replay = futures::stream::iter(events).then(move |event| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            event
        });
        let events: UpstreamStream = if hang {
            Box::pin(replay.chain(futures::stream::pending()))
        } else {
            Box::pin(replay)
        };

        let guard = ReleaseGuard(self.released.clone());
        Ok(Box::pin(events.map(move |event| {
            guard.hold();
            event
        })))
    }
}
