//! Schema-wide checks shared by the build stages.

pub mod naming;
pub mod relation;
