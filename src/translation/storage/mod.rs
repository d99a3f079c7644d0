//! 存储模块
//!
//! 语言偏好的持久化。

pub mod preferences;

pub use preferences::{
    open_preference_store, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore,
};
