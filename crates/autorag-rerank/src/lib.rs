pub mod batch;
pub mod config;
pub mod error;
pub mod factory;
pub mod providers;
pub mod registry;
pub mod reranker;
pub mod traits;
pub mod types;

pub use batch::process_batch;
pub use config::*;
pub use error::{ProviderError, RerankError};
pub use factory::*;
pub use registry::*;
pub use reranker::*;
pub use traits::*;
pub use types::*;

pub use autorag_core::{
    CandidateTable, Column, ColumnFrame, QueryCandidates, QueryRanking, RerankColumns,
    RerankResult, ShapeMismatchError,
};
