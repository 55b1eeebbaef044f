pub mod input_buffer;
pub mod markdown;
pub mod wrap;
