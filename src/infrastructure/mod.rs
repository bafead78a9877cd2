pub mod stages;
pub mod storage;
