//! Cross-module tests for ranking behavior.

pub(crate) mod stub;
