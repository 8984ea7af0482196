pub mod config_service;
pub mod in_memory_session_repository;
pub mod in_memory_transcript_repository;
pub mod json_dir_session_repository;
pub mod json_dir_transcript_repository;
pub mod notifier;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::in_memory_session_repository::InMemorySessionRepository;
pub use crate::in_memory_transcript_repository::InMemoryTranscriptRepository;
pub use crate::json_dir_session_repository::JsonDirSessionRepository;
pub use crate::json_dir_transcript_repository::JsonDirTranscriptRepository;
pub use crate::notifier::{LogNotifier, OutboxNotifier};
pub use crate::paths::LeadflowPaths;
