// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FuncionarioStore,
    models::funcionario::{Claims, Funcionario, FuncionarioPublico},
    services::{
        notificador::Notificador,
        senha::{gerar_senha_temporaria, PoliticaSenha},
        token::TokenIssuer,
    },
};

// Cargos autorizados a resetar senhas e provisionar credenciais.
// A checagem é sempre feita aqui, nunca delegada à "confiança de rede".
const CARGOS_GESTAO: [&str; 2] = ["Administrador", "Gerente"];

// Resultado do login: sessão completa ou troca obrigatória pendente.
#[derive(Debug)]
pub enum LoginOutcome {
    PrimeiroAcesso {
        token_temp: String,
    },
    Autenticado {
        token: String,
        funcionario: FuncionarioPublico,
    },
}

// Como o chamador da troca de senha se autentica.
pub enum TrocaSenhaAuth {
    PrimeiroAcesso { token_temp: String },
    Sessao { token: String, senha_atual: String },
}

pub struct ResetOutcome {
    pub matricula: String,
    pub senha_temporaria: String,
    pub enviado_whatsapp: bool,
}

pub struct ProvisionamentoOutcome {
    pub funcionario: FuncionarioPublico,
    pub matricula: String,
    pub senha_temporaria: String,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn FuncionarioStore>,
    tokens: TokenIssuer,
    politica: PoliticaSenha,
    notificador: Option<Arc<dyn Notificador>>,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn FuncionarioStore>,
        tokens: TokenIssuer,
        politica: PoliticaSenha,
        notificador: Option<Arc<dyn Notificador>>,
    ) -> Self {
        Self {
            repo,
            tokens,
            politica,
            notificador,
        }
    }

    pub fn verificar_sessao(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verificar_sessao(token)
    }

    pub async fn login(&self, matricula: &str, senha: &str) -> Result<LoginOutcome, AppError> {
        let matricula = matricula.trim().to_uppercase();

        // Matrícula inexistente e senha errada produzem o mesmo erro.
        let funcionario = self
            .repo
            .find_by_matricula(&matricula)
            .await?
            .ok_or(AppError::CredenciaisInvalidas)?;

        if !funcionario.ativo {
            return Err(AppError::ContaDesativada);
        }

        let senha_hash = funcionario
            .senha_hash
            .clone()
            .ok_or(AppError::NaoProvisionado)?;

        if !verificar_bcrypt(senha.to_owned(), senha_hash).await? {
            return Err(AppError::CredenciaisInvalidas);
        }

        if funcionario.primeiro_acesso {
            // Sem token de sessão: a troca de senha é obrigatória antes.
            let token_temp = self
                .tokens
                .emitir_primeiro_acesso(funcionario.id, &matricula)?;
            return Ok(LoginOutcome::PrimeiroAcesso { token_temp });
        }

        let token = self.tokens.emitir_sessao(
            funcionario.id,
            &matricula,
            funcionario.cargo.clone(),
            funcionario.loja.clone(),
        )?;
        self.repo.registrar_login(funcionario.id).await?;

        tracing::info!("Login de {}", matricula);
        Ok(LoginOutcome::Autenticado {
            token,
            funcionario: FuncionarioPublico::from(&funcionario),
        })
    }

    pub async fn trocar_senha(
        &self,
        autenticacao: TrocaSenhaAuth,
        nova_senha: &str,
    ) -> Result<(), AppError> {
        // A política é checada antes de qualquer validação de token,
        // para que o funcionário saiba o que corrigir primeiro.
        self.politica.validar(nova_senha)?;

        let id = match autenticacao {
            TrocaSenhaAuth::PrimeiroAcesso { token_temp } => {
                self.tokens.verificar_primeiro_acesso(&token_temp)?.sub
            }
            TrocaSenhaAuth::Sessao { token, senha_atual } => {
                let claims = self.tokens.verificar_sessao(&token)?;
                let funcionario = self
                    .repo
                    .find_by_id(claims.sub)
                    .await?
                    .ok_or(AppError::FuncionarioNaoEncontrado)?;
                let senha_hash = funcionario.senha_hash.ok_or(AppError::NaoProvisionado)?;
                if !verificar_bcrypt(senha_atual, senha_hash).await? {
                    return Err(AppError::SenhaAtualIncorreta);
                }
                claims.sub
            }
        };

        let novo_hash = hash_bcrypt(nova_senha.to_owned()).await?;
        self.repo.atualizar_senha(id, &novo_hash, false).await?;

        tracing::info!("Senha alterada para o funcionário {}", id);
        Ok(())
    }

    pub async fn resetar_senha(
        &self,
        caller: &Claims,
        matricula: Option<String>,
        user_id: Option<Uuid>,
    ) -> Result<ResetOutcome, AppError> {
        exigir_gestao(caller)?;

        let funcionario = match (user_id, matricula) {
            (Some(id), _) => self.repo.find_by_id(id).await?,
            (None, Some(m)) => self.repo.find_by_matricula(&m.trim().to_uppercase()).await?,
            (None, None) => {
                return Err(AppError::Validacao(
                    "Informe a matrícula ou o id do funcionário.".to_string(),
                ))
            }
        }
        .ok_or(AppError::FuncionarioNaoEncontrado)?;

        let matricula = funcionario.matricula.clone().ok_or_else(|| {
            AppError::Validacao("Funcionário ainda não possui credenciais.".to_string())
        })?;

        let senha_temporaria = gerar_senha_temporaria();
        let hash = hash_bcrypt(senha_temporaria.clone()).await?;

        // Sempre volta ao estado de primeiro acesso; `ativo` não muda.
        self.repo
            .atualizar_senha(funcionario.id, &hash, true)
            .await?;

        let enviado_whatsapp = self.notificar_reset(&funcionario, &senha_temporaria).await;

        tracing::info!(
            "Senha resetada para {} por {}",
            matricula,
            caller.matricula
        );
        Ok(ResetOutcome {
            matricula,
            senha_temporaria,
            enviado_whatsapp,
        })
    }

    pub async fn criar_credenciais(
        &self,
        caller: &Claims,
        user_id: Uuid,
        setor_code: &str,
    ) -> Result<ProvisionamentoOutcome, AppError> {
        exigir_gestao(caller)?;

        let alvo = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::FuncionarioNaoEncontrado)?;

        let matricula = self
            .repo
            .proxima_matricula(&setor_code.trim().to_uppercase())
            .await?;

        let senha_temporaria = gerar_senha_temporaria();
        let hash = hash_bcrypt(senha_temporaria.clone()).await?;

        let funcionario = self
            .repo
            .provisionar_credenciais(alvo.id, &matricula, &hash)
            .await?;

        tracing::info!(
            "Credenciais {} provisionadas por {}",
            matricula,
            caller.matricula
        );
        Ok(ProvisionamentoOutcome {
            funcionario: FuncionarioPublico::from(&funcionario),
            matricula,
            senha_temporaria,
        })
    }

    // Relê o registro: claims de cargo/loja no token podem estar defasadas.
    pub async fn funcionario_atual(&self, claims: &Claims) -> Result<FuncionarioPublico, AppError> {
        let funcionario = self
            .repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::FuncionarioNaoEncontrado)?;
        Ok(FuncionarioPublico::from(&funcionario))
    }

    async fn notificar_reset(&self, funcionario: &Funcionario, senha: &str) -> bool {
        let (Some(notificador), Some(telefone), Some(matricula)) = (
            self.notificador.as_ref(),
            funcionario.telefone.as_deref(),
            funcionario.matricula.as_deref(),
        ) else {
            return false;
        };

        match notificador
            .enviar_senha_temporaria(telefone, matricula, senha)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                // A mensagem de erro do canal nunca inclui a senha.
                tracing::warn!("Falha ao notificar reset de {}: {}", matricula, e);
                false
            }
        }
    }
}

fn exigir_gestao(claims: &Claims) -> Result<(), AppError> {
    let autorizado = claims
        .cargo
        .as_deref()
        .is_some_and(|cargo| CARGOS_GESTAO.contains(&cargo));
    if !autorizado {
        return Err(AppError::PermissaoInsuficiente);
    }
    Ok(())
}

// bcrypt é caro; roda fora do executor, como nas demais rotinas de hashing.
async fn hash_bcrypt(senha: String) -> Result<String, AppError> {
    let hash = tokio::task::spawn_blocking(move || hash(&senha, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hash)
}

async fn verificar_bcrypt(senha: String, senha_hash: String) -> Result<bool, AppError> {
    let valido = tokio::task::spawn_blocking(move || verify(&senha, &senha_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valido)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    // Store em memória: permite exercitar a máquina de estados do login
    // sem um banco provisionado.
    #[derive(Default)]
    struct StoreMemoria {
        registros: Mutex<Vec<Funcionario>>,
        logins: Mutex<Vec<Uuid>>,
    }

    impl StoreMemoria {
        fn com(funcionarios: Vec<Funcionario>) -> Arc<Self> {
            Arc::new(Self {
                registros: Mutex::new(funcionarios),
                logins: Mutex::new(Vec::new()),
            })
        }

        fn registro(&self, id: Uuid) -> Funcionario {
            self.registros
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.id == id)
                .cloned()
                .expect("registro inexistente")
        }
    }

    #[async_trait]
    impl FuncionarioStore for StoreMemoria {
        async fn find_by_matricula(
            &self,
            matricula: &str,
        ) -> Result<Option<Funcionario>, AppError> {
            Ok(self
                .registros
                .lock()
                .unwrap()
                .iter()
                .find(|f| {
                    f.matricula
                        .as_deref()
                        .is_some_and(|m| m.eq_ignore_ascii_case(matricula))
                })
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Funcionario>, AppError> {
            Ok(self
                .registros
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.id == id)
                .cloned())
        }

        async fn registrar_login(&self, id: Uuid) -> Result<(), AppError> {
            self.logins.lock().unwrap().push(id);
            Ok(())
        }

        async fn atualizar_senha(
            &self,
            id: Uuid,
            senha_hash: &str,
            primeiro_acesso: bool,
        ) -> Result<(), AppError> {
            let mut registros = self.registros.lock().unwrap();
            let funcionario = registros
                .iter_mut()
                .find(|f| f.id == id)
                .ok_or(AppError::FuncionarioNaoEncontrado)?;
            funcionario.senha_hash = Some(senha_hash.to_string());
            funcionario.primeiro_acesso = primeiro_acesso;
            Ok(())
        }

        async fn provisionar_credenciais(
            &self,
            id: Uuid,
            matricula: &str,
            senha_hash: &str,
        ) -> Result<Funcionario, AppError> {
            let mut registros = self.registros.lock().unwrap();
            let funcionario = registros
                .iter_mut()
                .find(|f| f.id == id)
                .ok_or(AppError::FuncionarioNaoEncontrado)?;
            funcionario.matricula = Some(matricula.to_string());
            funcionario.senha_hash = Some(senha_hash.to_string());
            funcionario.primeiro_acesso = true;
            funcionario.ativo = true;
            Ok(funcionario.clone())
        }

        async fn proxima_matricula(&self, setor: &str) -> Result<String, AppError> {
            Ok(format!("{setor}001"))
        }
    }

    fn funcionario(matricula: &str, senha: Option<&str>) -> Funcionario {
        Funcionario {
            id: Uuid::new_v4(),
            nome: "Fulano de Tal".to_string(),
            email: Some("fulano@loja.com.br".to_string()),
            telefone: None,
            cargo: Some("Vendedor".to_string()),
            loja: Some("Matriz".to_string()),
            matricula: Some(matricula.to_string()),
            // Custo baixo só para os testes
            senha_hash: senha.map(|s| bcrypt::hash(s, 4).unwrap()),
            primeiro_acesso: false,
            ativo: true,
            ultimo_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn servico(store: Arc<StoreMemoria>) -> AuthService {
        AuthService::new(
            store,
            TokenIssuer::new("segredo-de-teste".to_string()),
            PoliticaSenha::default(),
            None,
        )
    }

    fn claims_com_cargo(cargo: Option<&str>) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            matricula: "AD001".to_string(),
            cargo: cargo.map(str::to_string),
            loja: None,
            tipo: None,
            exp: (Utc::now().timestamp() + 3600) as usize,
            iat: Utc::now().timestamp() as usize,
        }
    }

    #[tokio::test]
    async fn login_valido_emite_sessao_e_registra_ultimo_login() {
        let registro = funcionario("AD001", Some("Temp123"));
        let id = registro.id;
        let store = StoreMemoria::com(vec![registro]);
        let servico = servico(store.clone());

        // Matrícula em minúsculas: a normalização é do serviço.
        let outcome = servico.login("ad001", "Temp123").await.unwrap();
        let LoginOutcome::Autenticado { token, funcionario } = outcome else {
            panic!("esperava sessão completa");
        };

        assert_eq!(funcionario.matricula.as_deref(), Some("AD001"));
        let claims = TokenIssuer::new("segredo-de-teste".to_string())
            .verificar_sessao(&token)
            .unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.matricula, "AD001");
        assert_eq!(store.logins.lock().unwrap().as_slice(), &[id]);
    }

    #[tokio::test]
    async fn matricula_desconhecida_e_senha_errada_produzem_o_mesmo_erro() {
        let servico = servico(StoreMemoria::com(vec![funcionario(
            "AD001",
            Some("Temp123"),
        )]));

        let desconhecida = servico.login("ZZ999", "Temp123").await.unwrap_err();
        let senha_errada = servico.login("AD001", "Errada1").await.unwrap_err();

        assert!(matches!(desconhecida, AppError::CredenciaisInvalidas));
        assert!(matches!(senha_errada, AppError::CredenciaisInvalidas));
        // Mesmo status e mesma mensagem: corpo idêntico nos dois casos.
        assert_eq!(desconhecida.to_string(), senha_errada.to_string());
    }

    #[tokio::test]
    async fn conta_desativada_e_recusada_mesmo_com_senha_correta() {
        let mut inativo = funcionario("AD001", Some("Temp123"));
        inativo.ativo = false;
        let servico = servico(StoreMemoria::com(vec![inativo]));

        assert!(matches!(
            servico.login("AD001", "Temp123").await,
            Err(AppError::ContaDesativada)
        ));
        assert!(matches!(
            servico.login("AD001", "Errada1").await,
            Err(AppError::ContaDesativada)
        ));
    }

    #[tokio::test]
    async fn conta_sem_hash_nao_autentica() {
        let servico = servico(StoreMemoria::com(vec![funcionario("AD001", None)]));

        assert!(matches!(
            servico.login("AD001", "Temp123").await,
            Err(AppError::NaoProvisionado)
        ));
    }

    #[tokio::test]
    async fn primeiro_acesso_retorna_apenas_token_temporario() {
        let mut novato = funcionario("VD007", Some("Temp123"));
        novato.primeiro_acesso = true;
        let id = novato.id;
        let store = StoreMemoria::com(vec![novato]);
        let servico = servico(store.clone());

        let outcome = servico.login("VD007", "Temp123").await.unwrap();
        let LoginOutcome::PrimeiroAcesso { token_temp } = outcome else {
            panic!("esperava troca obrigatória de senha");
        };

        let claims = TokenIssuer::new("segredo-de-teste".to_string())
            .verificar_primeiro_acesso(&token_temp)
            .unwrap();
        assert_eq!(claims.sub, id);
        // Sem sessão: ultimo_login não é registrado.
        assert!(store.logins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn troca_no_primeiro_acesso_limpa_o_flag_e_invalida_a_senha_antiga() {
        let mut novato = funcionario("VD007", Some("Temp123"));
        novato.primeiro_acesso = true;
        let id = novato.id;
        let store = StoreMemoria::com(vec![novato]);
        let servico = servico(store.clone());

        let LoginOutcome::PrimeiroAcesso { token_temp } =
            servico.login("VD007", "Temp123").await.unwrap()
        else {
            panic!("esperava troca obrigatória de senha");
        };

        servico
            .trocar_senha(TrocaSenhaAuth::PrimeiroAcesso { token_temp }, "Nova123")
            .await
            .unwrap();

        assert!(!store.registro(id).primeiro_acesso);
        assert!(matches!(
            servico.login("VD007", "Temp123").await,
            Err(AppError::CredenciaisInvalidas)
        ));
        assert!(matches!(
            servico.login("VD007", "Nova123").await.unwrap(),
            LoginOutcome::Autenticado { .. }
        ));
    }

    #[tokio::test]
    async fn troca_normal_exige_a_senha_atual_correta() {
        let registro = funcionario("AD001", Some("Temp123"));
        let servico = servico(StoreMemoria::com(vec![registro]));

        let LoginOutcome::Autenticado { token, .. } =
            servico.login("AD001", "Temp123").await.unwrap()
        else {
            panic!("esperava sessão completa");
        };

        assert!(matches!(
            servico
                .trocar_senha(
                    TrocaSenhaAuth::Sessao {
                        token: token.clone(),
                        senha_atual: "Errada1".to_string(),
                    },
                    "Nova123",
                )
                .await,
            Err(AppError::SenhaAtualIncorreta)
        ));

        servico
            .trocar_senha(
                TrocaSenhaAuth::Sessao {
                    token,
                    senha_atual: "Temp123".to_string(),
                },
                "Nova123",
            )
            .await
            .unwrap();
        assert!(matches!(
            servico.login("AD001", "Nova123").await.unwrap(),
            LoginOutcome::Autenticado { .. }
        ));
    }

    #[tokio::test]
    async fn reset_invalida_a_senha_antiga_e_reativa_o_primeiro_acesso() {
        let registro = funcionario("AD001", Some("Temp123"));
        let id = registro.id;
        let store = StoreMemoria::com(vec![registro]);
        let servico = servico(store.clone());

        let outcome = servico
            .resetar_senha(
                &claims_com_cargo(Some("Gerente")),
                Some("AD001".to_string()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.matricula, "AD001");
        assert!(!outcome.enviado_whatsapp);
        assert!(store.registro(id).primeiro_acesso);

        assert!(matches!(
            servico.login("AD001", "Temp123").await,
            Err(AppError::CredenciaisInvalidas)
        ));
        assert!(matches!(
            servico
                .login("AD001", &outcome.senha_temporaria)
                .await
                .unwrap(),
            LoginOutcome::PrimeiroAcesso { .. }
        ));
    }

    #[tokio::test]
    async fn provisionamento_atribui_matricula_do_setor_e_senha_temporaria() {
        let mut importado = funcionario("AD001", None);
        importado.matricula = None;
        importado.ativo = false;
        let id = importado.id;
        let servico = servico(StoreMemoria::com(vec![importado]));

        let outcome = servico
            .criar_credenciais(&claims_com_cargo(Some("Administrador")), id, "vd")
            .await
            .unwrap();

        assert_eq!(outcome.matricula, "VD001");
        assert!(matches!(
            servico
                .login("VD001", &outcome.senha_temporaria)
                .await
                .unwrap(),
            LoginOutcome::PrimeiroAcesso { .. }
        ));
    }

    #[test]
    fn apenas_administrador_e_gerente_passam_na_checagem_de_gestao() {
        assert!(exigir_gestao(&claims_com_cargo(Some("Administrador"))).is_ok());
        assert!(exigir_gestao(&claims_com_cargo(Some("Gerente"))).is_ok());

        assert!(matches!(
            exigir_gestao(&claims_com_cargo(Some("Vendedor"))),
            Err(AppError::PermissaoInsuficiente)
        ));
        assert!(matches!(
            exigir_gestao(&claims_com_cargo(None)),
            Err(AppError::PermissaoInsuficiente)
        ));
    }

    #[tokio::test]
    async fn hash_e_verificacao_fazem_par() {
        let hash = hash_bcrypt("Temp123".to_string()).await.unwrap();
        assert!(verificar_bcrypt("Temp123".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verificar_bcrypt("Errada1".to_string(), hash).await.unwrap());
    }
}
