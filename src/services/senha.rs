// src/services/senha.rs

use rand::Rng;

use crate::common::error::AppError;

const ALFABETO_BASE36: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// Política de complexidade aplicada a toda senha escolhida pelo funcionário.
// Injetada no AuthService para que as regras fiquem num lugar só.
#[derive(Clone)]
pub struct PoliticaSenha {
    tamanho_minimo: usize,
}

impl Default for PoliticaSenha {
    fn default() -> Self {
        Self { tamanho_minimo: 6 }
    }
}

impl PoliticaSenha {
    // Devolve a primeira regra violada, na ordem em que são checadas.
    pub fn validar(&self, senha: &str) -> Result<(), AppError> {
        if senha.chars().count() < self.tamanho_minimo {
            return Err(AppError::Validacao(format!(
                "A nova senha deve ter no mínimo {} caracteres.",
                self.tamanho_minimo
            )));
        }
        if !senha.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::Validacao(
                "A nova senha deve conter ao menos uma letra maiúscula.".to_string(),
            ));
        }
        if !senha.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::Validacao(
                "A nova senha deve conter ao menos um número.".to_string(),
            ));
        }
        Ok(())
    }
}

// Senha temporária no formato "Temp" + 6 caracteres base-36.
// O valor em claro só existe na resposta HTTP; nunca é logado nem persistido.
pub fn gerar_senha_temporaria() -> String {
    let mut rng = rand::rng();
    let sufixo: String = (0..6)
        .map(|_| ALFABETO_BASE36[rng.random_range(0..ALFABETO_BASE36.len())] as char)
        .collect();
    format!("Temp{sufixo}")
}
