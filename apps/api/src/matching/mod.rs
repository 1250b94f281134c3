// CV-to-job matching: embedding storage, job recommendation, CV analysis and
// cover-letter generation.
// All provider calls go through the Embedder / VectorStore / TextGenerator /
// DocumentRenderer traits injected into `MatchingPipeline`.

pub mod analysis;
pub mod archive;
pub mod cv_source;
pub mod handlers;
pub mod job_text;
pub mod models;
pub mod pipeline;
pub mod prompts;

pub use pipeline::MatchingPipeline;
