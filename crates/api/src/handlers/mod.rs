pub mod info;
pub mod reels;
