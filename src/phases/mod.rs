//! Phase functions (C3): intake, audit, decompose. Each takes ownership of a
//! `ProjectState` in the phase it expects and returns one advanced to the
//! next, refusing on a phase mismatch.

pub mod audit;
pub mod decompose;
pub mod intake;
