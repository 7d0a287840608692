pub mod locking;
pub mod store;
pub mod work_dir;

pub use locking::WorkspaceLock;
pub use store::{DocumentStore, FsDocumentStore, MemoryStore};
pub use work_dir::WorkDir;
