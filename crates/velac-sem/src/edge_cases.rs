//! Cross-feature edge case tests for velac-sem.
