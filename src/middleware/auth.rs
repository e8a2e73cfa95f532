use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{common::error::AppError, config::AppState, models::funcionario::Claims};

// Extrator para obter as claims do funcionário autenticado nos handlers.
// Não há tabela de sessões: o estado "autenticado" é rederivado do token
// a cada requisição.
pub struct FuncionarioAutenticado(pub Claims);

impl FromRequestParts<AppState> for FuncionarioAutenticado {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::TokenInvalido)?;

        let claims = state.auth_service.verificar_sessao(bearer.token())?;
        Ok(Self(claims))
    }
}
