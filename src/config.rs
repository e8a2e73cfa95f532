// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::FuncionarioRepository,
    services::{
        auth::AuthService,
        notificador::{Notificador, WhatsAppNotificador},
        senha::PoliticaSenha,
        token::TokenIssuer,
    },
};

// Configuração explícita carregada na inicialização. Não existe segredo
// de fallback embutido: sem JWT_SECRET a aplicação não sobe.
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub whatsapp_bot_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET deve ser definido"))?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let whatsapp_bot_url = env::var("WHATSAPP_BOT_URL").ok();

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            whatsapp_bot_url,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, settings))
    }

    // Monta o gráfico de dependências a partir de um pool já criado.
    pub fn from_pool(db_pool: PgPool, settings: &Settings) -> Self {
        let repo = Arc::new(FuncionarioRepository::new(db_pool.clone()));
        let tokens = TokenIssuer::new(settings.jwt_secret.clone());

        let notificador: Option<Arc<dyn Notificador>> = settings
            .whatsapp_bot_url
            .clone()
            .map(|url| Arc::new(WhatsAppNotificador::new(url)) as Arc<dyn Notificador>);

        let auth_service = AuthService::new(repo, tokens, PoliticaSenha::default(), notificador);

        Self {
            db_pool,
            auth_service,
        }
    }
}
