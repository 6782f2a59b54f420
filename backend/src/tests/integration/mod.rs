pub mod api_schedule;
pub mod pg_store;
