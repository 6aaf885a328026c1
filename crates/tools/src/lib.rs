pub mod escape;
pub mod stack_trace;
