pub mod analysis;
pub mod job_description;
