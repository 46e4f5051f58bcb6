pub mod attempt_service;
pub mod authoring;
pub mod draft_service;
pub mod mongo_store;
pub mod player;
pub mod quiz_repository;
pub mod results_service;
pub mod session_service;
pub mod store;
