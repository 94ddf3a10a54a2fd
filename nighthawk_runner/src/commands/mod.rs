pub mod convert;
pub mod detect;
pub mod manifest;
