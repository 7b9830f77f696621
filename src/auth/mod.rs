pub mod gate;
pub mod ownership;
pub mod password;
pub mod token;
