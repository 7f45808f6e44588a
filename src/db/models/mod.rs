pub mod anchor_word;
pub mod draft;
pub mod rhyme;
pub mod session;
pub mod writing_box;

pub use anchor_word::{AnchorWord, NewAnchorWord, ANCHOR_SLOTS};
pub use draft::{Draft, NewDraft};
pub use rhyme::{NewRhyme, Rhyme, RhymeSource, RhymeType};
pub use session::{NewSession, Perspective, Session, SessionPatch, SessionStatus};
pub use writing_box::{BoxPatch, NewBox, WritingBox};
