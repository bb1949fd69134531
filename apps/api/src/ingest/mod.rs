// Input acquisition: CV text out of an uploaded PDF, job description text
// out of a posting URL. Both surface failures as validation errors — bad
// input, not a broken service.

pub mod job_posting;
pub mod pdf;
