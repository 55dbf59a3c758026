pub mod account;
pub mod api;
pub mod config;
pub mod content;
pub mod db;
pub mod format;
pub mod logging;
pub mod middleware;
pub mod orm;
pub mod path;
pub mod vote;
pub mod web;

