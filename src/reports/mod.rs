// Reports module - terminal summaries of a calculation run

pub mod summary;

pub use summary::{format_summary_table, summarize, SeriesSummary};
