//! Fixed instruction texts. Prompt quality is not tuned here; the engines
//! only depend on each instruction being distinct.

pub mod parallel;
pub mod router;
