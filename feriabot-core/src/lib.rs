pub mod balance;
pub mod confirm;
pub mod errors;
pub mod keywords;
pub mod pending;
pub mod replies;
pub mod router;
pub mod traits;

pub use confirm::{ConfirmationFlow, AUTO_COMMIT_CONFIDENCE};
pub use errors::{ClassifyError, ProcessError, StoreError, TransportError};
pub use pending::PendingStore;
pub use router::MessageRouter;
pub use traits::{Messenger, TransactionClassifier, TransactionStore};
