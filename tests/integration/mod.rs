//! Integration tests for the wxcat metadata catalog

mod aggregate;
mod concurrency;
mod record_frame;
