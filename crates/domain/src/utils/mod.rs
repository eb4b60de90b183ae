//! Pure helpers with no I/O

pub mod username;
