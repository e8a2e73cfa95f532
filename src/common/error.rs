use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação com mensagem própria (política de senha, requisição malformada)
    #[error("{0}")]
    Validacao(String),

    // Mesma mensagem para matrícula inexistente e senha errada,
    // para não permitir enumeração de contas.
    #[error("Matrícula ou senha incorretos.")]
    CredenciaisInvalidas,

    #[error("Conta sem credenciais provisionadas. Procure o administrador.")]
    NaoProvisionado,

    #[error("Token inválido ou expirado.")]
    TokenInvalido,

    #[error("Senha atual incorreta.")]
    SenhaAtualIncorreta,

    #[error("Conta desativada. Entre em contato com o administrador.")]
    ContaDesativada,

    #[error("Apenas administradores e gerentes podem executar esta operação.")]
    PermissaoInsuficiente,

    #[error("Funcionário não encontrado.")]
    FuncionarioNaoEncontrado,

    #[error("Falha ao gerar matrícula: {0}")]
    GeracaoMatricula(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::Validacao(_) => StatusCode::BAD_REQUEST,
            AppError::CredenciaisInvalidas
            | AppError::NaoProvisionado
            | AppError::TokenInvalido
            | AppError::SenhaAtualIncorreta => StatusCode::UNAUTHORIZED,
            AppError::ContaDesativada | AppError::PermissaoInsuficiente => StatusCode::FORBIDDEN,
            AppError::FuncionarioNaoEncontrado => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match &self {
            // Devolve a primeira mensagem de validação do payload.
            AppError::ValidationError(errors) => errors
                .field_errors()
                .into_iter()
                .flat_map(|(_, field_errors)| field_errors.iter())
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "Um ou mais campos são inválidos.".to_string()),

            // Erros esperados carregam mensagens seguras para exibição direta.
            e if status != StatusCode::INTERNAL_SERVER_ERROR => e.to_string(),

            // Todos os outros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga o detalhe; o cliente recebe uma mensagem genérica.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}
