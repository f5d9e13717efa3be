//! Background loops.

pub mod ingest_loop;
