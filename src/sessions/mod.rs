//! Session lifecycle: creation with its default perspectives, boxes and
//! first draft, plus the optimistic list actions behind the sidebar.

pub mod actions;
pub mod create;

use thiserror::Error;

use crate::store::StoreError;

pub use actions::SessionActions;
pub use create::{create_session, default_perspectives};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a session needs a spark to start from")]
    EmptySpark,

    #[error(transparent)]
    Store(#[from] StoreError),
}
