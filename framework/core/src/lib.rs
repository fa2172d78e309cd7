mod shutdown;
mod skip;

pub mod prelude {
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener, ShutdownSignalError};
    pub use crate::skip::ClusterUnreachableError;
}
