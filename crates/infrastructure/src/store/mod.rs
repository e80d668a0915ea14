mod atomic;
mod yaml_store;

pub use atomic::write_atomic;
pub use yaml_store::{
    YamlRecordStore, ATTRIBUTES_FILE, FEED_FORWARD_FILE, GOALS_FILE, SETTINGS_FILE,
    STAKEHOLDERS_FILE, USER_NOTES_FILE,
};
