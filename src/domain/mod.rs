pub mod catalog;
pub mod collector;
pub mod disks;
pub mod extract;
pub mod identity;
pub mod parse;
pub mod snapshot;
