//! Raw configuration sources

pub mod file;
pub mod memory;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::ConfigResult;
use crate::raw::RawMap;

pub use file::FileSource;
pub use memory::StaticSource;

/// Supplier of raw configuration for one location
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Location this source reads from, used in error messages
    fn location(&self) -> &str;

    /// Read the current raw configuration
    async fn retrieve(&self) -> ConfigResult<RawMap>;

    /// Release every resource held by the source. Must be idempotent.
    async fn close(&self) -> ConfigResult<()>;

    /// Change notifications; the value is a generation counter bumped on
    /// every observed change. `None` when the source cannot be watched.
    fn watch(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}
