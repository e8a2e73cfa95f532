// src/services/notificador.rs

use async_trait::async_trait;
use serde_json::json;

// Canal fora de banda para entregar a senha temporária após um reset.
// Falha de entrega nunca derruba a operação, só o flag `enviado_whatsapp`.
#[async_trait]
pub trait Notificador: Send + Sync {
    async fn enviar_senha_temporaria(
        &self,
        telefone: &str,
        matricula: &str,
        senha: &str,
    ) -> anyhow::Result<()>;
}

// Integração com o bot de WhatsApp da loja.
pub struct WhatsAppNotificador {
    client: reqwest::Client,
    base_url: String,
}

impl WhatsAppNotificador {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl Notificador for WhatsAppNotificador {
    async fn enviar_senha_temporaria(
        &self,
        telefone: &str,
        matricula: &str,
        senha: &str,
    ) -> anyhow::Result<()> {
        let mensagem = format!(
            "Sua senha foi redefinida.\nMatrícula: {matricula}\nSenha temporária: {senha}\n\
             Você precisará trocá-la no próximo login."
        );

        let resposta = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&json!({ "telefone": telefone, "mensagem": mensagem }))
            .send()
            .await?;

        resposta.error_for_status()?;
        Ok(())
    }
}
