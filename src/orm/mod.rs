pub mod accounts;
pub mod votes;
