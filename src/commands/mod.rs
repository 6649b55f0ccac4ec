pub mod ingest;
pub mod status;
