pub mod compiler;
pub(crate) mod optimize;
pub mod program;
