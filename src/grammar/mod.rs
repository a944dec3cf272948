//! The grammars fed to the [Earley parser](crate::earley).
//!
//! Grammars are built once, on first use, and shared by every parse afterwards.
pub mod c;
pub mod character;
