pub mod controls;
pub mod panels;
