// src/db/funcionario_repo.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::funcionario::Funcionario};

const COLUNAS: &str = "id, nome, email, telefone, cargo, loja, matricula, senha_hash, \
                       primeiro_acesso, ativo, ultimo_login, created_at, updated_at";

// Contrato de acesso à tabela de funcionários. O AuthService só conhece
// este trait; a implementação de produção fica logo abaixo.
#[async_trait]
pub trait FuncionarioStore: Send + Sync {
    async fn find_by_matricula(&self, matricula: &str) -> Result<Option<Funcionario>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Funcionario>, AppError>;

    async fn registrar_login(&self, id: Uuid) -> Result<(), AppError>;

    // Grava um novo hash. Usado pela troca de senha (primeiro_acesso = false)
    // e pelo reset administrativo (primeiro_acesso = true).
    async fn atualizar_senha(
        &self,
        id: Uuid,
        senha_hash: &str,
        primeiro_acesso: bool,
    ) -> Result<(), AppError>;

    // Provisionamento inicial: atribui matrícula e senha temporária,
    // reativa a conta e força a troca no primeiro acesso.
    async fn provisionar_credenciais(
        &self,
        id: Uuid,
        matricula: &str,
        senha_hash: &str,
    ) -> Result<Funcionario, AppError>;

    async fn proxima_matricula(&self, setor: &str) -> Result<String, AppError>;
}

// O repositório de funcionários, responsável por todas as interações
// com a tabela 'funcionarios'.
#[derive(Clone)]
pub struct FuncionarioRepository {
    pool: PgPool,
}

impl FuncionarioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FuncionarioStore for FuncionarioRepository {
    // Busca por matrícula, sem distinção de caixa. O chamador já normaliza
    // para maiúsculas; o `upper()` aqui cobre registros antigos.
    async fn find_by_matricula(&self, matricula: &str) -> Result<Option<Funcionario>, AppError> {
        let maybe = sqlx::query_as::<_, Funcionario>(&format!(
            "SELECT {COLUNAS} FROM funcionarios WHERE upper(matricula) = $1"
        ))
        .bind(matricula)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Funcionario>, AppError> {
        let maybe = sqlx::query_as::<_, Funcionario>(&format!(
            "SELECT {COLUNAS} FROM funcionarios WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe)
    }

    async fn registrar_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE funcionarios SET ultimo_login = $1, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn atualizar_senha(
        &self,
        id: Uuid,
        senha_hash: &str,
        primeiro_acesso: bool,
    ) -> Result<(), AppError> {
        let resultado = sqlx::query(
            "UPDATE funcionarios \
             SET senha_hash = $1, primeiro_acesso = $2, updated_at = now() \
             WHERE id = $3",
        )
        .bind(senha_hash)
        .bind(primeiro_acesso)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if resultado.rows_affected() == 0 {
            return Err(AppError::FuncionarioNaoEncontrado);
        }
        Ok(())
    }

    async fn provisionar_credenciais(
        &self,
        id: Uuid,
        matricula: &str,
        senha_hash: &str,
    ) -> Result<Funcionario, AppError> {
        let funcionario = sqlx::query_as::<_, Funcionario>(&format!(
            "UPDATE funcionarios \
             SET matricula = $1, senha_hash = $2, primeiro_acesso = TRUE, \
                 ativo = TRUE, updated_at = now() \
             WHERE id = $3 \
             RETURNING {COLUNAS}"
        ))
        .bind(matricula)
        .bind(senha_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::FuncionarioNaoEncontrado)?;

        Ok(funcionario)
    }

    // A sequência de matrículas é de responsabilidade do banco
    // (função `gerar_proxima_matricula`), nunca calculada em memória.
    async fn proxima_matricula(&self, setor: &str) -> Result<String, AppError> {
        let matricula: String = sqlx::query_scalar("SELECT gerar_proxima_matricula($1)")
            .bind(setor)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::GeracaoMatricula(e.to_string()))?;
        Ok(matricula)
    }
}
