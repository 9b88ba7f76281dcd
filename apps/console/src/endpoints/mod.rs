//! REST wrappers over the backend. Each function maps its arguments onto one
//! [`RequestContext`](crate::client::RequestContext) and sends it through the
//! shared [`ApiClient`](crate::client::ApiClient); none of them touch
//! credentials.

pub mod applications;
pub mod cooptations;
pub mod job_postings;
pub mod opportunities;
