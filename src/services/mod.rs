pub mod document_service;
pub mod seed_service;
pub mod storage;
pub mod student_service;
pub mod user_service;
