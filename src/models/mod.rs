pub mod result;
pub mod trial;

pub use result::{ResultRecord, SESSION_KEY_PREFIX};
pub use trial::{Outcome, Session, Trial};
