use axum::{extract::State, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::FuncionarioAutenticado,
    models::funcionario::{
        CriarCredenciaisPayload, CriarCredenciaisResponse, LoginPayload, LoginResponse,
        MensagemResponse, ResetarSenhaPayload, ResetarSenhaResponse, TrocarSenhaPayload,
        UsuarioAtualResponse,
    },
    services::auth::{LoginOutcome, TrocaSenhaAuth},
};

// Handler de login por matrícula
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let outcome = app_state
        .auth_service
        .login(&payload.matricula, &payload.senha)
        .await?;

    let resposta = match outcome {
        LoginOutcome::PrimeiroAcesso { token_temp } => LoginResponse::PrimeiroAcesso {
            success: true,
            primeiro_acesso: true,
            token_temp,
            message: "Primeiro acesso: é obrigatório trocar a senha.".to_string(),
        },
        LoginOutcome::Autenticado { token, funcionario } => LoginResponse::Sessao {
            success: true,
            token,
            user: funcionario,
        },
    };
    Ok(Json(resposta))
}

// Handler de troca de senha (primeiro acesso ou troca normal)
pub async fn trocar_senha(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(payload): Json<TrocarSenhaPayload>,
) -> Result<Json<MensagemResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let autenticacao = match (payload.token_temp, bearer, payload.senha_atual) {
        (Some(token_temp), _, _) => TrocaSenhaAuth::PrimeiroAcesso { token_temp },
        (None, Some(TypedHeader(Authorization(bearer))), Some(senha_atual)) => {
            TrocaSenhaAuth::Sessao {
                token: bearer.token().to_string(),
                senha_atual,
            }
        }
        _ => {
            return Err(AppError::Validacao(
                "Requisição inválida: envie o token temporário ou a senha atual.".to_string(),
            ))
        }
    };

    app_state
        .auth_service
        .trocar_senha(autenticacao, &payload.nova_senha)
        .await?;

    Ok(Json(MensagemResponse {
        success: true,
        message: "Senha alterada com sucesso.".to_string(),
    }))
}

// Handler administrativo de reset de senha
pub async fn resetar_senha(
    State(app_state): State<AppState>,
    FuncionarioAutenticado(claims): FuncionarioAutenticado,
    Json(payload): Json<ResetarSenhaPayload>,
) -> Result<Json<ResetarSenhaResponse>, AppError> {
    let outcome = app_state
        .auth_service
        .resetar_senha(&claims, payload.matricula, payload.user_id)
        .await?;

    // Única vez em que a senha temporária aparece em claro.
    Ok(Json(ResetarSenhaResponse {
        success: true,
        matricula: outcome.matricula,
        senha_temporaria: outcome.senha_temporaria,
        enviado_whatsapp: outcome.enviado_whatsapp,
        message: "Senha temporária gerada. O funcionário deverá trocá-la no próximo login."
            .to_string(),
    }))
}

// Handler administrativo de provisionamento de credenciais
pub async fn criar_credenciais(
    State(app_state): State<AppState>,
    FuncionarioAutenticado(claims): FuncionarioAutenticado,
    Json(payload): Json<CriarCredenciaisPayload>,
) -> Result<Json<CriarCredenciaisResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let outcome = app_state
        .auth_service
        .criar_credenciais(&claims, payload.user_id, &payload.setor_code)
        .await?;

    Ok(Json(CriarCredenciaisResponse {
        success: true,
        user: outcome.funcionario,
        matricula: outcome.matricula,
        senha_temporaria: outcome.senha_temporaria,
        message: "Credenciais criadas. Senha temporária válida apenas para o primeiro acesso."
            .to_string(),
    }))
}

// Handler da rota protegida /me
pub async fn usuario_atual(
    State(app_state): State<AppState>,
    FuncionarioAutenticado(claims): FuncionarioAutenticado,
) -> Result<Json<UsuarioAtualResponse>, AppError> {
    let user = app_state.auth_service.funcionario_atual(&claims).await?;
    Ok(Json(UsuarioAtualResponse {
        success: true,
        user,
    }))
}
