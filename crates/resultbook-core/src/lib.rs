pub mod active;
pub mod config;
pub mod errors;
pub mod ids;
pub mod mapper;
pub mod model;
pub mod repository;
pub mod storage;
pub mod view;

pub use ids::BASE_RESULT_ID;
pub use mapper::{build_lines_from_authorization, parse_records, AuthorizationRecord};
pub use model::{LineDraft, ResultLine, ResultMeta, SaveResultRequest, Units, XCode};
pub use repository::ResultRepository;
pub use storage::{KvStore, MemoryKv, SqliteKv};
