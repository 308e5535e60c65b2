pub mod messages;
pub mod meta;
