pub mod firestore;
pub mod remote;
#[cfg(test)]
pub(crate) mod testing;

pub use remote::{RemoteSync, SyncReceipt};
