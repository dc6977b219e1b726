//! Export the issues of a GitHub repository to a CSV file.
//!
//! Walks the paginated REST issues listing (pull requests excluded) and
//! flattens each issue into one row. When a Projects-v2 board is
//! configured, the issue's typed project field values are resolved into
//! extra `proj_`-prefixed columns.

pub mod config;
pub mod csv;
pub mod duration;
pub mod export;
pub mod github;
pub mod models;
pub mod project;
pub mod table;
