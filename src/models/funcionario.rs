// src/models/funcionario.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Representa um funcionário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Funcionario {
    pub id: Uuid,
    pub nome: String,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cargo: Option<String>,
    pub loja: Option<String>,
    // Nulos até o provisionamento de credenciais
    pub matricula: Option<String>,
    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub senha_hash: Option<String>,
    pub primeiro_acesso: bool,
    pub ativo: bool,
    pub ultimo_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Perfil público devolvido nas respostas (nunca inclui o hash)
#[derive(Debug, Clone, Serialize)]
pub struct FuncionarioPublico {
    pub id: Uuid,
    pub nome: String,
    pub cargo: Option<String>,
    pub matricula: Option<String>,
    pub loja: Option<String>,
    pub email: Option<String>,
}

impl From<&Funcionario> for FuncionarioPublico {
    fn from(f: &Funcionario) -> Self {
        Self {
            id: f.id,
            nome: f.nome.clone(),
            cargo: f.cargo.clone(),
            matricula: f.matricula.clone(),
            loja: f.loja.clone(),
            email: f.email.clone(),
        }
    }
}

// Dados para login por matrícula. Campos ausentes viram strings vazias
// (`serde(default)`) para que a falta deles caia na validação (400),
// não na desserialização.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Matrícula e senha são obrigatórias."))]
    pub matricula: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Matrícula e senha são obrigatórias."))]
    pub senha: String,
}

// Dados para troca de senha (primeiro acesso OU troca normal)
#[derive(Debug, Deserialize, Validate)]
pub struct TrocarSenhaPayload {
    pub token_temp: Option<String>,
    pub senha_atual: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "A nova senha é obrigatória."))]
    pub nova_senha: String,
}

// Reset administrativo: aceita matrícula OU id do funcionário
#[derive(Debug, Deserialize)]
pub struct ResetarSenhaPayload {
    pub matricula: Option<String>,
    pub user_id: Option<Uuid>,
}

// Provisionamento administrativo de credenciais
#[derive(Debug, Deserialize, Validate)]
pub struct CriarCredenciaisPayload {
    pub user_id: Uuid,
    #[validate(length(equal = 2, message = "O código do setor deve ter 2 letras."))]
    pub setor_code: String,
}

// Resposta de login: ou sessão completa, ou token temporário de primeiro acesso
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    PrimeiroAcesso {
        success: bool,
        primeiro_acesso: bool,
        token_temp: String,
        message: String,
    },
    Sessao {
        success: bool,
        token: String,
        user: FuncionarioPublico,
    },
}

#[derive(Debug, Serialize)]
pub struct MensagemResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResetarSenhaResponse {
    pub success: bool,
    pub matricula: String,
    pub senha_temporaria: String,
    pub enviado_whatsapp: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CriarCredenciaisResponse {
    pub success: bool,
    pub user: FuncionarioPublico,
    pub matricula: String,
    pub senha_temporaria: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UsuarioAtualResponse {
    pub success: bool,
    pub user: FuncionarioPublico,
}

// Estrutura de dados ("claims") dentro do JWT.
// Tokens de sessão carregam cargo/loja; o token de primeiro acesso
// carrega apenas `tipo: "primeiro_acesso"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub matricula: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loja: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
