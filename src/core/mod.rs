// Domain-layer modules and shared errors/models
pub mod candidates {
    pub use crate::candidates::*;
}

pub mod triangulation {
    pub use crate::triangulation::*;
}

pub mod reading_need {
    pub use crate::reading_need::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
