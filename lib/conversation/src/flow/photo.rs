//! Cases printed with a customer photo.
//!
//! Each case takes two prompts: the model or theme, then the photo file
//! name. Corrections always name the case and both fields:
//! `capinha <n>, <theme>, <file>`.

use super::{BACK_HINT, FlowContext, POST_FLOW_OPTIONS, Step, place_order};
use crate::input::{self, Confirmation, CountError};
use crate::order::{Customization, OrderKind, PhotoItem};
use crate::session::ActiveFlow;
use serde::{Deserialize, Serialize};

const THEME_QUESTION: &str = "Qual o modelo do celular ou tema da capinha?";
const CORRECTION_FORMAT: &str = "Por favor, diga o número da capinha, o novo modelo/tema e o nome \
do arquivo da foto. (Ex: Capinha 1, iPhone 13, nova_foto.jpg)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PhotoStage {
    AwaitingCount,
    AwaitingModelTheme,
    /// Theme received, waiting for its photo.
    AwaitingPhotoUpload { theme: String },
    Confirming,
    AwaitingCorrectionTarget,
}

/// State of the photo customization flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFlow {
    stage: PhotoStage,
    items: Vec<PhotoItem>,
    expected: usize,
}

impl From<PhotoFlow> for ActiveFlow {
    fn from(flow: PhotoFlow) -> Self {
        Self::PhotoCustomization(flow)
    }
}

impl PhotoFlow {
    /// Starts the flow and returns the count question.
    #[must_use]
    pub fn start() -> (Self, String) {
        let flow = Self {
            stage: PhotoStage::AwaitingCount,
            items: Vec::new(),
            expected: 0,
        };
        let reply = format!(
            "Certo! Quantas capinhas você gostaria de personalizar com foto? {BACK_HINT}"
        );
        (flow, reply)
    }

    #[must_use]
    pub fn stage(&self) -> &PhotoStage {
        &self.stage
    }

    #[must_use]
    pub fn items(&self) -> &[PhotoItem] {
        &self.items
    }

    pub(crate) fn step(self, text: &str, ctx: &FlowContext<'_>) -> Step {
        match self.stage.clone() {
            PhotoStage::AwaitingCount => self.on_count(text),
            PhotoStage::AwaitingModelTheme => self.on_theme(text),
            PhotoStage::AwaitingPhotoUpload { theme } => self.on_photo(theme, text),
            PhotoStage::Confirming => self.on_confirmation(text, ctx),
            PhotoStage::AwaitingCorrectionTarget => self.on_correction_target(text),
        }
    }

    fn on_count(mut self, text: &str) -> Step {
        match input::parse_count(text) {
            Ok(count) => {
                self.expected = count;
                self.stage = PhotoStage::AwaitingModelTheme;
                Step::stay(
                    self,
                    format!("Ok! Para a Capinha 1: {THEME_QUESTION} (Ex: iPhone 13, Tema Flores) {BACK_HINT}"),
                )
            }
            Err(CountError::NotPositive) => Step::stay(
                self,
                format!(
                    "Por favor, digite um número válido de capinhas (maior que zero). {BACK_HINT}"
                ),
            ),
            Err(CountError::NotANumber) => {
                Step::stay(self, format!("Por favor, digite um número válido. {BACK_HINT}"))
            }
        }
    }

    fn on_theme(mut self, text: &str) -> Step {
        let theme = text.trim();
        if theme.is_empty() {
            return Step::stay(
                self,
                format!(
                    "Por favor, digite o modelo do celular ou tema da capinha. \
                     (Ex: iPhone 13, Tema Flores) {BACK_HINT}"
                ),
            );
        }

        let reply = format!(
            "Certo, para a Capinha {} ({theme}): Agora, por favor, envie a foto que você gostaria \
             de usar. (Você pode digitar o nome do arquivo da foto, ex: minha_foto.jpg) {BACK_HINT}",
            self.items.len() + 1
        );
        self.stage = PhotoStage::AwaitingPhotoUpload {
            theme: theme.to_string(),
        };
        Step::stay(self, reply)
    }

    fn on_photo(mut self, theme: String, text: &str) -> Step {
        let filename = text.trim();
        if !input::is_photo_filename(filename) {
            return Step::stay(
                self,
                format!(
                    "Não consegui identificar um arquivo de imagem. Por favor, envie a foto \
                     digitando o nome do arquivo (ex: minha_foto.jpg, foto_do_pet.png). {BACK_HINT}"
                ),
            );
        }

        self.items.push(PhotoItem {
            theme,
            photo_filename: filename.to_string(),
        });

        let received = self.items.len();
        if received < self.expected {
            self.stage = PhotoStage::AwaitingModelTheme;
            let reply = format!(
                "Ótimo! Foto recebida para a Capinha {received}. Agora, para a Capinha {}: \
                 {THEME_QUESTION} (Ex: Samsung S21, Outro Tema) {BACK_HINT}",
                received + 1
            );
            return Step::stay(self, reply);
        }

        self.stage = PhotoStage::Confirming;
        let reply = format!(
            "Perfeito! Suas personalizações com foto são:\n{}\nEstá tudo correto? (Sim/Não) {BACK_HINT}",
            self.summary()
        );
        Step::stay(self, reply)
    }

    fn on_confirmation(mut self, text: &str, ctx: &FlowContext<'_>) -> Step {
        match input::parse_confirmation(&input::normalize(text)) {
            Some(Confirmation::Yes) => {
                let order_id = place_order(ctx, self.items.into_iter().map(Customization::Photo));
                let reply = format!(
                    "Ótimo! Seu pedido de personalização com foto (ID: {order_id}) foi registrado e \
                     será processado. Caso haja alguma irregularidade na foto, um atendente humano \
                     entrará em contato para resolver. {POST_FLOW_OPTIONS}"
                );
                Step::OrderPlaced {
                    kind: OrderKind::Photo,
                    reply,
                }
            }
            Some(Confirmation::No) => {
                self.stage = PhotoStage::AwaitingCorrectionTarget;
                let reply = format!(
                    "Ah, entendi! O que você gostaria de corrigir?\n\
                     Suas personalizações atuais são:\n{}\n\
                     {CORRECTION_FORMAT} Ou digite 'Voltar' para o menu principal para recomeçar.",
                    self.summary()
                );
                Step::stay(self, reply)
            }
            None => Step::stay(self, format!("Por favor, responda 'Sim' ou 'Não'. {BACK_HINT}")),
        }
    }

    fn on_correction_target(mut self, text: &str) -> Step {
        let parsed = input::parse_case_reference(text).and_then(|reference| {
            let (theme, filename) = reference.rest.split_once(',')?;
            let theme = theme.trim();
            (!theme.is_empty()).then(|| (reference.position, theme, filename.trim()))
        });
        let Some((position, theme, filename)) = parsed else {
            return Step::stay(
                self,
                format!("Formato inválido. {CORRECTION_FORMAT} {BACK_HINT}"),
            );
        };

        let Some(index) = input::item_index(position, self.items.len()) else {
            return Step::stay(
                self,
                format!(
                    "Número de capinha inválido. Por favor, digite um número de capinha existente. {BACK_HINT}"
                ),
            );
        };

        if !input::is_photo_filename(filename) {
            return Step::stay(
                self,
                format!(
                    "Nome de arquivo de foto inválido. Por favor, certifique-se de que termina com \
                     .jpg, .jpeg, .png ou .gif. {BACK_HINT}"
                ),
            );
        }

        self.items[index] = PhotoItem {
            theme: theme.to_string(),
            photo_filename: filename.to_string(),
        };
        self.stage = PhotoStage::Confirming;
        let reply = format!(
            "Capinha {} atualizada para Modelo/Tema: '{theme}', Foto: '{filename}'.\n\
             Suas personalizações são:\n{}\n\
             Está tudo correto agora? (Sim/Não) {BACK_HINT}",
            index + 1,
            self.summary()
        );
        Step::stay(self, reply)
    }

    fn summary(&self) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "- Capinha {}: Modelo/Tema: {}, Foto: {}",
                    i + 1,
                    item.theme,
                    item.photo_filename
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
