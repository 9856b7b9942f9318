pub mod palette;
pub mod session;
pub mod theme;
pub mod viewport;
pub mod visibility;
