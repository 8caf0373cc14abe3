pub mod clock;
pub mod handlers;
pub mod ingestion;
pub mod providers;
pub mod reconciler;
pub mod scheduler;
pub mod solutions;
