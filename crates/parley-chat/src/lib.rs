//! Chat session state for Parley.
//!
//! Everything here is view-agnostic: a front-end implements [`ChatView`] and
//! forwards user interactions to [`ChatSession`].

mod attachments;
mod config_store;
mod session;
mod settings;
mod storage;
mod transcript;
mod view;

pub use attachments::*;
pub use config_store::*;
pub use session::*;
pub use settings::*;
pub use storage::*;
pub use transcript::*;
pub use view::*;
