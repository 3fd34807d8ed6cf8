// Library for tests to access modules

pub mod archive_repo;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod reader;
pub mod render;
pub mod report;
pub mod snmp;
pub mod version;
