pub mod chart;
pub mod controls;
pub mod text_input;
