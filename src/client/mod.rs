//! Client side of the post editor: draft state, image conversion, the
//! notice queue and the HTTP calls to the post API.

pub mod api;
pub mod draft;
pub mod form;
pub mod image;
pub mod notice;

pub use api::{ClientError, HttpPostApi, PostApi};
pub use draft::{Draft, DraftField};
pub use form::{FormMode, PostForm, SubmitOutcome};
pub use notice::{Notice, NoticeLevel, Notifier};
