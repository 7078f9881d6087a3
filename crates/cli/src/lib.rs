//! livetrace command line support
//!
//! Library half of the `lt` binary, split out so integration tests and the
//! binary share the same launch, lock and sink code.

pub mod launch;
pub mod locks;
pub mod logging;
pub mod sink;
pub mod system_config;
pub mod util;
