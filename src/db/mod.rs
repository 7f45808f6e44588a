mod connection;
mod helpers;
mod migrations;
pub mod models;
mod remote_store;
mod repositories;

pub use connection::Database;
pub use models::{
    AnchorWord, Draft, Perspective, Rhyme, RhymeSource, RhymeType, Session, SessionPatch,
    SessionStatus, WritingBox,
};
