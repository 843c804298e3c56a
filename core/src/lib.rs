mod error;
pub mod format;
mod load;
pub mod store;
mod types;
pub mod ui_state;
pub mod view;

pub use error::{LoadError, ParseEnumError};
pub use load::{load_tokens_json, parse_tokens};
pub use store::{TokenChanges, TokenDelta, TokenStore};
pub use types::*;
pub use ui_state::{ActiveTab, FilterPatch, Modal, UiState};
pub use view::{CachedView, TokenView};
