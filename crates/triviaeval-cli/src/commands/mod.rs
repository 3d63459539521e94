pub mod collect;
pub mod evaluate;
pub mod init;
pub mod token;
pub mod validate;
