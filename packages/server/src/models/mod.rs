pub mod catalog;
pub mod clo;
pub mod course;
pub mod mapping;
pub mod offering;
pub mod plo;
pub mod program;
pub mod shared;
