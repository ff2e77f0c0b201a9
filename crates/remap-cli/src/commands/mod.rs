pub mod config;
pub mod grids;
pub mod run;
