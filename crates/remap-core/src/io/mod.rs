pub mod array;
pub mod fbf;

pub use array::ArrayRef;
