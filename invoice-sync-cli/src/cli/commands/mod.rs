pub mod extract;
pub mod publish;
pub mod sync;
