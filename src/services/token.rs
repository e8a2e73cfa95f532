// src/services/token.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{common::error::AppError, models::funcionario::Claims};

pub const TIPO_PRIMEIRO_ACESSO: &str = "primeiro_acesso";

// Emite e verifica os tokens portadores. O segredo vem da configuração;
// a ausência dele derruba a aplicação na inicialização, nunca há fallback.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    // Token de sessão: 24 horas, carrega cargo e loja.
    pub fn emitir_sessao(
        &self,
        id: Uuid,
        matricula: &str,
        cargo: Option<String>,
        loja: Option<String>,
    ) -> Result<String, AppError> {
        self.emitir(id, matricula, cargo, loja, None, Duration::hours(24))
    }

    // Token de primeiro acesso: 15 minutos, serve apenas para trocar a senha.
    pub fn emitir_primeiro_acesso(&self, id: Uuid, matricula: &str) -> Result<String, AppError> {
        self.emitir(
            id,
            matricula,
            None,
            None,
            Some(TIPO_PRIMEIRO_ACESSO.to_string()),
            Duration::minutes(15),
        )
    }

    fn emitir(
        &self,
        id: Uuid,
        matricula: &str,
        cargo: Option<String>,
        loja: Option<String>,
        tipo: Option<String>,
        validade: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: id,
            matricula: matricula.to_string(),
            cargo,
            loja,
            tipo,
            exp: (now + validade).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    // Assinatura inválida e expiração são indistinguíveis para o chamador.
    pub fn verificar(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::TokenInvalido)?;

        Ok(token_data.claims)
    }

    // Um token temporário de primeiro acesso nunca vale como sessão.
    pub fn verificar_sessao(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verificar(token)?;
        if claims.tipo.is_some() {
            return Err(AppError::TokenInvalido);
        }
        Ok(claims)
    }

    pub fn verificar_primeiro_acesso(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.verificar(token)?;
        if claims.tipo.as_deref() != Some(TIPO_PRIMEIRO_ACESSO) {
            return Err(AppError::TokenInvalido);
        }
        Ok(claims)
    }
}
