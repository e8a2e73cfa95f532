pub mod auth;
pub mod notificador;
pub mod senha;
pub mod token;
