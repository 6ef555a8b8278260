pub mod normal_mode;
pub mod pipeline;
