pub mod board;
pub mod error;
pub mod player;
pub mod layout;
pub mod movegen;
pub mod legality;
pub mod evaluation;
pub mod game;
pub mod search;
pub mod console;
