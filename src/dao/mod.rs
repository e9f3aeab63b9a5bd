/// High score persistence.
pub mod score_store;
/// Storage abstraction layer shared by score stores.
pub mod storage;
