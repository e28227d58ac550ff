//! Canned store responses.
//!
//! Responses live in a line-oriented text resource maintained by the store
//! staff. Each rule block looks like:
//!
//! ```text
//! ✔ MENU_PRINCIPAL
//! Frases-exemplo para treinamento: menu, opções
//! RESPOSTA:
//! Olá! Como posso te auxiliar hoje?
//! 1 - Personalizar capinha com nome
//! ----------------------------------------------------------------------
//! ```
//!
//! The marker line carries the key, anything between the marker and the
//! `RESPOSTA:` line is ignored, and the body runs until a divider line, the
//! next marker or the end of the resource. Text following `RESPOSTA:` on the
//! same line is part of the body.

use crate::error::RuleStoreError;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Reply used when a key has no rule.
pub const FALLBACK_RESPONSE: &str = "Desculpe, não encontrei informações sobre isso no momento. \
Por favor, digite 'Falar com atendimento humano' para obter ajuda.";

const MARKER: char = '✔';
const RESPONSE_TAG: &str = "RESPOSTA:";

/// Minimal rules used when the resource cannot be read.
const BUILTIN_RULES: &str = "\
✔ SAUDACAO_INICIAL
RESPOSTA: Olá! Tudo bem? Eu sou sua assistente virtual. Para eu te ajudar, digite o numero da opção desejada:

✔ MENU_PRINCIPAL
RESPOSTA: Olá! Eu sou sua assistente virtual. Como posso te auxiliar hoje?
1 - Personalizar capinha com nome
2 - Personalizar capinha com foto
3 - Quero consultar se tem capinha para meu modelo de celular ou com algum tema de desenho especifico
4 - Solicitar Devolução/Reembolso
5 - Outras Informações/Dúvidas
6 - Sair do Atendimento

✔ PEDIDO_NOME_JA_ENVIADO
RESPOSTA: Seu pedido de personalização com nome já foi registrado. Para alterar um nome já enviado, \
é necessário falar com um atendente humano. Se deseja prosseguir com o atendimento humano, digite \
\"Falar com atendimento humano\". Caso contrário, por favor, escolha outra opção do menu principal.
";

/// Keys of the rules the assistant reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKey {
    Greeting,
    MainMenu,
    FaqMenu,
    TransferOffer,
    StoreScriptError,
    OutOfMenu,
    Farewell,
    HumanCancelled,
    NameOrderAlreadySent,
    ShippingDelay,
    WrongPurchase,
    Payment,
    CaseApproval,
    IllustrativeImages,
    UnknownModel,
    FontChange,
    CaseProtection,
    YellowingCase,
    DiscountCoupon,
}

impl RuleKey {
    /// Returns the key as written in the rule resource.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "SAUDACAO_INICIAL",
            Self::MainMenu => "MENU_PRINCIPAL",
            Self::FaqMenu => "SUBMENU_DUVIDAS",
            Self::TransferOffer => "TRANSFERENCIA_OFERECER",
            Self::StoreScriptError => "ERRO_LOJA_SCRIPT",
            Self::OutOfMenu => "RESPOSTA_FORA_MENU",
            Self::Farewell => "SAIR_ATENDIMENTO",
            Self::HumanCancelled => "CANCELAR_ATENDIMENTO_HUMANO",
            Self::NameOrderAlreadySent => "PEDIDO_NOME_JA_ENVIADO",
            Self::ShippingDelay => "LOGISTICA_ATRASO",
            Self::WrongPurchase => "COMPRA_INCORRETA",
            Self::Payment => "PAGAMENTO_COMPLETO",
            Self::CaseApproval => "APROVACAO_VER_CAPINHA",
            Self::IllustrativeImages => "IMAGENS_ILUSTRATIVAS",
            Self::UnknownModel => "MODELO_DESCONHECIDO",
            Self::FontChange => "ALTERAR_FONTE_LETRA",
            Self::CaseProtection => "CAPINHA_PROTECAO",
            Self::YellowingCase => "CAPINHA_AMARELA",
            Self::DiscountCoupon => "CUPOM_DESCONTO",
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyed canned responses. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    responses: HashMap<String, String>,
}

impl RuleSet {
    /// Parses a rule resource. Blocks without a response body are skipped,
    /// and the first block wins when a key repeats.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut responses = HashMap::new();
        let mut block = Block::Outside;

        for line in source.lines() {
            let trimmed = line.trim();

            if let Some(key) = marker_key(trimmed) {
                block.flush_into(&mut responses);
                block = Block::Header(key.to_string());
                continue;
            }
            if is_divider(trimmed) {
                block.flush_into(&mut responses);
                block = Block::Outside;
                continue;
            }

            let opened = match &block {
                Block::Header(key) => trimmed
                    .strip_prefix(RESPONSE_TAG)
                    .map(|rest| Block::Body(key.clone(), vec![rest.trim_start().to_string()])),
                _ => None,
            };
            if let Some(body) = opened {
                block = body;
            } else if let Block::Body(_, lines) = &mut block {
                lines.push(line.to_string());
            }
        }
        block.flush_into(&mut responses);

        Self { responses }
    }

    /// Reads and parses the rule resource at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Report<RuleStoreError>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| RuleStoreError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::parse(&source))
    }

    /// Loads the rule resource, substituting the built-in rules when it
    /// cannot be read.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(rules) => {
                info!(path = %path.display(), rules = rules.len(), "loaded store rules");
                rules
            }
            Err(report) => {
                warn!(error = %report, "using built-in store rules");
                Self::builtin()
            }
        }
    }

    /// The built-in rules: greeting, main menu and the name-order lock notice.
    #[must_use]
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_RULES)
    }

    /// Returns the response for `key`, or [`FALLBACK_RESPONSE`].
    #[must_use]
    pub fn lookup(&self, key: &str) -> &str {
        match self.responses.get(key) {
            Some(response) => response,
            None => {
                debug!(key, "no rule for key");
                FALLBACK_RESPONSE
            }
        }
    }

    /// Returns the response for a known rule key.
    #[must_use]
    pub fn get(&self, key: RuleKey) -> &str {
        self.lookup(key.as_str())
    }

    /// Returns true if a rule exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.responses.contains_key(key)
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// Parser position within the resource.
enum Block {
    Outside,
    Header(String),
    Body(String, Vec<String>),
}

impl Block {
    fn flush_into(&mut self, responses: &mut HashMap<String, String>) {
        match std::mem::replace(self, Self::Outside) {
            Self::Body(key, lines) => {
                let body = lines.join("\n").trim().to_string();
                if body.is_empty() {
                    debug!(key, "rule has an empty response");
                } else {
                    responses.entry(key).or_insert(body);
                }
            }
            Self::Header(key) => debug!(key, "rule has no response section"),
            Self::Outside => {}
        }
    }
}

fn marker_key(line: &str) -> Option<&str> {
    line.strip_prefix(MARKER)
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

fn is_divider(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}
