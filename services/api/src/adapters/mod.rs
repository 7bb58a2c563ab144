pub mod db;
pub mod files;

pub use db::DbAdapter;
pub use files::LocalFileStore;
