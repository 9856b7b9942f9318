pub mod export;
pub mod interaction;
pub mod projection;
