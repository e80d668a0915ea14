//! Value Objects - immutable domain concepts

mod record_id;
mod record_state;

pub use record_id::RecordId;
pub use record_state::RecordState;
