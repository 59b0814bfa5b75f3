pub mod catalog;
pub mod clo;
pub mod course;
pub mod course_plo;
pub mod offering;
pub mod plo;
pub mod plo_clo;
pub mod program;
