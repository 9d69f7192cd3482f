pub mod core;
pub mod mythcraft;
