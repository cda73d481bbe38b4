pub mod form_dto;
pub mod job_dto;
