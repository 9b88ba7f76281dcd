pub mod application;
pub mod cooptation;
pub mod job_posting;
pub mod opportunity;
pub mod page;

pub use page::Page;
