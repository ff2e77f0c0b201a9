pub mod backend;
pub mod consts;
pub mod error;
pub mod grid;
pub mod io;
pub mod job;
pub mod pool;
pub mod projection;
pub mod remap;
