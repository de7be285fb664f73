//! Export of finished reports to practice-management systems (CRMs).

mod crm;
mod payload;
mod transport;
mod vendors;

pub use crm::*;
pub use payload::*;
pub use transport::*;
pub use vendors::*;
