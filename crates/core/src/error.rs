//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot concatenate an empty chunk list")]
    EmptyChunks,
}
