//! Session domain: models, modes, and the repository contract.

pub mod message;
pub mod mode;
pub mod model;
pub mod repository;

pub use message::{Message, MessageRole};
pub use mode::ChatMode;
pub use model::{Session, TITLE_MAX_CHARS};
pub use repository::SessionRepository;
