//! External service integrations.

pub mod gateway_client {
    pub use crate::gateway_client::*;
}

pub mod holidays {
    pub use crate::holidays::*;
}

pub mod soap {
    pub use crate::soap::*;
}
