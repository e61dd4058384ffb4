//! Runtime component contract

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{ComponentError, ComponentResult};

/// Services the hosting process offers to running components
pub trait Host: Send + Sync {
    /// Report an error the component cannot recover from
    fn report_fatal_error(&self, error: ComponentError);
}

/// Host that only logs fatal errors
#[derive(Debug, Clone, Copy, Default)]
pub struct NopHost;

impl Host for NopHost {
    fn report_fatal_error(&self, error: ComponentError) {
        tracing::error!(target: "component", error = %error, "Fatal component error reported");
    }
}

/// A running component instance created by a [`crate::Factory`]
#[async_trait]
pub trait Component: Send + Sync {
    /// Start the component. Called once before any other use.
    async fn start(&mut self, cancel: &CancellationToken, host: &dyn Host) -> ComponentResult<()>;

    /// Stop the component and release its resources
    async fn shutdown(&mut self, cancel: &CancellationToken) -> ComponentResult<()>;
}
