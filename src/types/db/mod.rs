// Database entities - SeaORM models
pub mod artist;
pub mod follow;
pub mod format;
pub mod image;
pub mod role;
pub mod size;
pub mod title;
pub mod user;
