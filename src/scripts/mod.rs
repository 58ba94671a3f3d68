//! Script subsystem.
//!
//! ```text
//! ScriptExecutor
//! ├── loader: ScriptLoader
//! │   ├── scripts: Vec<ScriptHandle>   (startup directory, loaded eagerly)
//! │   └── on_demand                    (read on first request, then kept)
//! └── runtime: Box<dyn ScriptRuntime>
//! ```

mod error;
mod executor;
mod loader;
mod runtime;

pub use error::{ScriptError, ScriptResult};
pub use executor::ScriptExecutor;
pub use loader::{ScriptHandle, ScriptLoader, ScriptOrigin};
pub use runtime::{InterpreterRuntime, ScriptRuntime};
