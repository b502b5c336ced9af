pub mod mimetype;
pub mod probe;
