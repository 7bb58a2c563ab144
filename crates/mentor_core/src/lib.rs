pub mod domain;
pub mod ports;
pub mod time;

pub use domain::{Final, Meeting, Plan, Profile, ProfileChanges, ProfileFilter, ProfileRecords};
pub use ports::{FileStore, PortError, PortResult, ProfileStore};
