pub mod battles;
pub mod directory;
pub mod players;
pub mod progress;
