mod association;
mod class;
mod event;
mod field;
mod index;
mod inheritance;
mod on_delete;
mod schema;
mod types;

pub use association::*;
pub use class::*;
pub use event::*;
pub use field::*;
pub use index::*;
pub use inheritance::*;
pub use on_delete::*;
pub use schema::*;
pub use types::*;
