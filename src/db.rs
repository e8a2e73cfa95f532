pub mod funcionario_repo;
pub use funcionario_repo::{FuncionarioRepository, FuncionarioStore};
