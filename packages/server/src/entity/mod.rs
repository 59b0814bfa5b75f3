pub mod clo;
pub mod course;
pub mod course_clo;
pub mod course_plo;
pub mod plo;
pub mod plo_clo;
pub mod program;
pub mod program_course;
pub mod program_plo;
pub mod section;
pub mod semester;
