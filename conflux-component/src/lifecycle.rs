//! Reusable start/shutdown behaviour for components
//!
//! Components with no real startup or teardown work hold a [`Lifecycle`] and
//! delegate their [`Component`] methods to it instead of repeating no-op
//! implementations. Hooks can be attached when a component needs a small
//! amount of synchronous work at either stage.

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::component::{Component, Host};
use crate::error::ComponentResult;

type StartHook = Box<dyn Fn(&dyn Host) -> ComponentResult<()> + Send + Sync>;
type ShutdownHook = Box<dyn Fn() -> ComponentResult<()> + Send + Sync>;

/// Start/shutdown implementation that succeeds unless a hook fails
#[derive(Default)]
pub struct Lifecycle {
    start: Option<StartHook>,
    shutdown: Option<ShutdownHook>,
}

impl Lifecycle {
    /// Lifecycle whose start and shutdown do nothing
    pub fn nop() -> Self {
        Self::default()
    }

    /// Run `hook` when the component starts
    pub fn on_start<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Host) -> ComponentResult<()> + Send + Sync + 'static,
    {
        self.start = Some(Box::new(hook));
        self
    }

    /// Run `hook` when the component shuts down
    pub fn on_shutdown<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> ComponentResult<()> + Send + Sync + 'static,
    {
        self.shutdown = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("start", &self.start.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}

#[async_trait]
impl Component for Lifecycle {
    async fn start(&mut self, _cancel: &CancellationToken, host: &dyn Host) -> ComponentResult<()> {
        match &self.start {
            Some(hook) => hook(host),
            None => Ok(()),
        }
    }

    async fn shutdown(&mut self, _cancel: &CancellationToken) -> ComponentResult<()> {
        match &self.shutdown {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }
}
