//! Cases engraved with a name.
//!
//! The customer says how many cases they want, then sends
//! `<model>, <name>` once per case. Names must fit the engraving rules in
//! [`crate::input::is_valid_name`]. A rejected name parks the model until a
//! valid replacement arrives. After all cases are in, the summary is
//! confirmed or individual names are corrected with `capinha <n>, <name>`.

use super::{BACK_HINT, FlowContext, POST_FLOW_OPTIONS, Step, place_order};
use crate::input::{self, Confirmation, CountError};
use crate::order::{Customization, NameItem, OrderKind};
use crate::session::ActiveFlow;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ITEM_EXAMPLES_FIRST: &str = "(Exemplos: 'iPhone 13, Alex', 'Capa verde, José', 'Estampa BS-056, João')";
const ITEM_EXAMPLES_NEXT: &str = "(Exemplos: 'Samsung S21, Maria', 'Capa azul, Pedro', 'Estampa BS-057, Ana')";
const ITEM_QUESTION: &str = "Qual o **modelo do celular ou estampa** e o **nome** que você gostaria de gravar? \
Lembre-se de separar por vírgula.";
const NAME_RULES: &str = "diga um nome menor, até 20 caracteres, sem símbolos ou emojis.";

/// Where the name flow is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum NameStage {
    AwaitingCount,
    AwaitingModelAndName,
    /// The last name was refused; `model` waits for a valid name.
    AwaitingNameCorrection { model: String, rejected_name: String },
    Confirming,
    AwaitingCorrectionTarget,
}

/// State of the name customization flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFlow {
    stage: NameStage,
    items: Vec<NameItem>,
    expected: usize,
}

impl From<NameFlow> for ActiveFlow {
    fn from(flow: NameFlow) -> Self {
        Self::NameCustomization(flow)
    }
}

impl NameFlow {
    /// Starts the flow and returns the count question.
    #[must_use]
    pub fn start() -> (Self, String) {
        let flow = Self {
            stage: NameStage::AwaitingCount,
            items: Vec::new(),
            expected: 0,
        };
        let reply = format!(
            "Certo! Quantas capinhas você gostaria de personalizar com nome? {BACK_HINT}"
        );
        (flow, reply)
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> &NameStage {
        &self.stage
    }

    /// Items collected so far.
    #[must_use]
    pub fn items(&self) -> &[NameItem] {
        &self.items
    }

    /// Number of cases the customer asked for.
    #[must_use]
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Handles one customer message.
    pub(crate) fn step(self, text: &str, ctx: &FlowContext<'_>) -> Step {
        match self.stage.clone() {
            NameStage::AwaitingCount => self.on_count(text),
            NameStage::AwaitingModelAndName => self.on_item(text),
            NameStage::AwaitingNameCorrection { model, .. } => self.on_name_correction(model, text),
            NameStage::Confirming => self.on_confirmation(text, ctx),
            NameStage::AwaitingCorrectionTarget => self.on_correction_target(text),
        }
    }

    fn on_count(mut self, text: &str) -> Step {
        match input::parse_count(text) {
            Ok(count) => {
                self.expected = count;
                self.stage = NameStage::AwaitingModelAndName;
                let reply = format!(
                    "Ok! Para a Capinha 1: {ITEM_QUESTION} {ITEM_EXAMPLES_FIRST} {BACK_HINT}"
                );
                Step::stay(self, reply)
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

    fn on_item(mut self, text: &str) -> Step {
        let Some((model, name)) = text.split_once(',') else {
            return Step::stay(
                self,
                format!(
                    "Por favor, digite o modelo do celular ou estampa e o nome separados por vírgula. \
                     {ITEM_EXAMPLES_FIRST} {BACK_HINT}"
                ),
            );
        };
        let model = model.trim().to_string();
        let name = input::strip_name_prefix(name);

        if !input::is_valid_name(&name) {
            debug!(position = self.items.len() + 1, "engraving name refused");
            let reply = format!(
                "Para que sua capinha com o nome '{name}' fique perfeita, {NAME_RULES} \
                 Ou digite 'Voltar' para o menu principal."
            );
            self.stage = NameStage::AwaitingNameCorrection {
                model,
                rejected_name: name,
            };
            return Step::stay(self, reply);
        }

        self.items.push(NameItem {
            model,
            engraved_name: name,
        });
        self.next_item_or_confirm()
    }

    fn on_name_correction(mut self, model: String, text: &str) -> Step {
        let name = input::strip_name_prefix(text);
        if !input::is_valid_name(&name) {
            return Step::stay(
                self,
                format!("Ainda não consegui entender o nome. Por favor, {NAME_RULES} {BACK_HINT}"),
            );
        }

        self.items.push(NameItem {
            model,
            engraved_name: name,
        });
        self.next_item_or_confirm()
    }

    fn next_item_or_confirm(mut self) -> Step {
        if self.items.len() < self.expected {
            self.stage = NameStage::AwaitingModelAndName;
            let reply = format!(
                "Certo! Para a Capinha {}: {ITEM_QUESTION} {ITEM_EXAMPLES_NEXT} {BACK_HINT}",
                self.items.len() + 1
            );
            return Step::stay(self, reply);
        }

        self.stage = NameStage::Confirming;
        let reply = format!(
            "Perfeito! Suas personalizações são:\n{}\nEstá tudo correto? (Sim/Não) {BACK_HINT}",
            self.summary()
        );
        Step::stay(self, reply)
    }

    fn on_confirmation(mut self, text: &str, ctx: &FlowContext<'_>) -> Step {
        match input::parse_confirmation(&input::normalize(text)) {
            Some(Confirmation::Yes) => {
                let order_id = place_order(ctx, self.items.into_iter().map(Customization::Name));
                let reply = format!(
                    "Ótimo! Seu pedido de personalização com nome (ID: {order_id}) foi registrado e \
                     será processado. Em breve você receberá mais informações. {POST_FLOW_OPTIONS}"
                );
                Step::OrderPlaced {
                    kind: OrderKind::Name,
                    reply,
                }
            }
            Some(Confirmation::No) => {
                self.stage = NameStage::AwaitingCorrectionTarget;
                let reply = format!(
                    "Ah, entendi! O que você gostaria de corrigir?\n\
                     Suas personalizações atuais são:\n{}\n\
                     Por favor, diga o número da capinha e o novo nome. (Ex: Capinha 1, Novo Nome) \
                     Ou digite 'Voltar' para o menu principal para recomeçar.",
                    self.numbered_summary()
                );
                Step::stay(self, reply)
            }
            None => Step::stay(self, format!("Por favor, responda 'Sim' ou 'Não'. {BACK_HINT}")),
        }
    }

    fn on_correction_target(mut self, text: &str) -> Step {
        let (position, name_text) = match input::parse_case_reference(text) {
            Some(reference) => (reference.position, reference.rest),
            None if self.items.len() == 1 => (Some(1), text),
            None => {
                return Step::stay(
                    self,
                    "Desculpe, não consegui identificar para qual capinha é o novo nome. \
                     Por favor, diga o número da capinha e o novo nome. \
                     (Exemplos: 'Capinha 1, Novo Nome') Ou digite 'Voltar' para o menu principal.",
                );
            }
        };

        let Some(index) = input::item_index(position, self.items.len()) else {
            return Step::stay(
                self,
                format!(
                    "Número de capinha inválido. Por favor, digite um número de capinha existente. {BACK_HINT}"
                ),
            );
        };

        let name = input::strip_name_prefix(name_text);
        if !input::is_valid_name(&name) {
            return Step::stay(
                self,
                format!("O nome '{name}' é inválido. Por favor, {NAME_RULES} {BACK_HINT}"),
            );
        }

        self.items[index].engraved_name = name.clone();
        self.stage = NameStage::Confirming;
        let reply = format!(
            "Nome da Capinha {} atualizado para '{name}'.\n\
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
            .map(|item| format!("- Modelo: {}, Nome: {}", item.model, item.engraved_name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn numbered_summary(&self) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "- Capinha {}: Modelo: {}, Nome: {}",
                    i + 1,
                    item.model,
                    item.engraved_name
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderIdGenerator;
    use crate::order::testing::RecordingSink;
    use crate::rules::RuleSet;
    use chrono::Utc;

    struct Harness {
        rules: RuleSet,
        orders: OrderIdGenerator,
        sink: RecordingSink,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                rules: RuleSet::builtin(),
                orders: OrderIdGenerator::new(),
                sink: RecordingSink::default(),
            }
        }

        fn ctx(&self) -> FlowContext<'_> {
            FlowContext {
                rules: &self.rules,
                orders: &self.orders,
                sink: &self.sink,
                now: Utc::now(),
            }
        }

        /// Feeds `inputs` in order, returning the final flow and last reply.
        fn run(&self, inputs: &[&str]) -> (Option<NameFlow>, Step) {
            let (mut flow, reply) = NameFlow::start();
            let mut last = Step::stay(flow.clone(), reply);
            for text in inputs {
                last = flow.step(text, &self.ctx());
                match &last {
                    Step::Continue(ActiveFlow::NameCustomization(next), _) => flow = next.clone(),
                    _ => return (None, last),
                }
            }
            (Some(flow), last)
        }
    }

    fn reply(step: &Step) -> &str {
        match step {
            Step::Continue(_, reply) | Step::Finish(reply) => reply,
            Step::OrderPlaced { reply, .. } | Step::Handoff { reply, .. } => reply,
            Step::Release => "",
        }
    }

    #[test]
    fn bad_counts_keep_waiting_for_count() {
        let harness = Harness::new();
        for bad in ["0", "-1", "duas"] {
            let (flow, _) = harness.run(&[bad]);
            let flow = flow.expect("still in flow");
            assert_eq!(flow.stage(), &NameStage::AwaitingCount);
            assert!(flow.items().is_empty());
        }
    }

    #[test]
    fn count_requires_that_many_items() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["3", "iPhone 13, Alex", "Galaxy S21, Bia"]);
        let flow = flow.expect("still in flow");
        assert_eq!(flow.stage(), &NameStage::AwaitingModelAndName);
        assert_eq!(flow.expected(), 3);
        assert_eq!(flow.items().len(), 2);
        assert!(reply(&step).contains("Capinha 3"));

        let (flow, step) = harness.run(&["3", "iPhone 13, Alex", "Galaxy S21, Bia", "Moto G, Caio"]);
        assert_eq!(flow.expect("in flow").stage(), &NameStage::Confirming);
        assert!(reply(&step).contains("- Modelo: Moto G, Nome: Caio"));
    }

    #[test]
    fn missing_comma_reprompts() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["1", "iPhone 13 Alex"]);
        let flow = flow.expect("in flow");
        assert_eq!(flow.stage(), &NameStage::AwaitingModelAndName);
        assert!(reply(&step).contains("separados por vírgula"));
    }

    #[test]
    fn name_prefix_is_stripped_and_model_keeps_commas_after_first() {
        let harness = Harness::new();
        let (flow, _) = harness.run(&["1", "Capa verde, nome José Carlos"]);
        let flow = flow.expect("in flow");
        assert_eq!(flow.items()[0].model, "Capa verde");
        assert_eq!(flow.items()[0].engraved_name, "José Carlos");
    }

    #[test]
    fn invalid_name_parks_model_without_losing_items() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["2", "iPhone 13, Alex", "Galaxy S21, R2D2"]);
        let flow = flow.expect("in flow");
        assert_eq!(
            flow.stage(),
            &NameStage::AwaitingNameCorrection {
                model: "Galaxy S21".to_string(),
                rejected_name: "R2D2".to_string(),
            }
        );
        assert_eq!(flow.items().len(), 1);
        assert!(reply(&step).contains("'R2D2'"));
    }

    #[test]
    fn name_correction_uses_parked_model() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&[
            "1",
            "Galaxy S21, Um nome comprido demais aqui",
            "Ana 3",
            "nome Ana",
        ]);
        let flow = flow.expect("in flow");
        assert_eq!(flow.stage(), &NameStage::Confirming);
        assert_eq!(
            flow.items(),
            &[NameItem {
                model: "Galaxy S21".to_string(),
                engraved_name: "Ana".to_string(),
            }]
        );
        assert!(reply(&step).contains("Está tudo correto?"));
    }

    #[test]
    fn twenty_one_characters_is_refused() {
        let harness = Harness::new();
        let (flow, _) = harness.run(&["1", "iPhone 13, Maria Eduarda Santoss"]);
        assert!(matches!(
            flow.expect("in flow").stage(),
            NameStage::AwaitingNameCorrection { .. }
        ));

        let (flow, _) = harness.run(&["1", "iPhone 13, Maria Eduarda Santos"]);
        assert_eq!(flow.expect("in flow").stage(), &NameStage::Confirming);
    }

    #[test]
    fn confirmation_places_order_with_every_item() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["2", "iPhone 13, Alex", "Moto G, Bia", "SIM"]);
        assert!(flow.is_none());
        assert!(matches!(
            step,
            Step::OrderPlaced {
                kind: OrderKind::Name,
                ..
            }
        ));
        assert!(reply(&step).contains("1 - Voltar ao menu principal"));

        let records = harness.sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, records[1].0);
        assert!(reply(&step).contains(&records[0].0.to_string()));
    }

    #[test]
    fn unclear_confirmation_reprompts() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["1", "iPhone 13, Alex", "talvez"]);
        assert_eq!(flow.expect("in flow").stage(), &NameStage::Confirming);
        assert!(reply(&step).contains("'Sim' ou 'Não'"));
    }

    #[test]
    fn single_item_correction_needs_no_index() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["1", "iPhone 13, Alex", "não", "Alexandre"]);
        let flow = flow.expect("in flow");
        assert_eq!(flow.stage(), &NameStage::Confirming);
        assert_eq!(flow.items()[0].engraved_name, "Alexandre");
        assert!(reply(&step).contains("Nome da Capinha 1 atualizado para 'Alexandre'"));
    }

    #[test]
    fn multi_item_correction_requires_index() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["2", "iPhone 13, Alex", "Moto G, Bia", "nao", "Beatriz"]);
        assert_eq!(
            flow.expect("in flow").stage(),
            &NameStage::AwaitingCorrectionTarget
        );
        assert!(reply(&step).contains("para qual capinha"));
    }

    #[test]
    fn correction_keeps_customer_casing() {
        let harness = Harness::new();
        let (flow, _) = harness.run(&["2", "iPhone 13, Alex", "Moto G, Bia", "não", "Capinha 2, Beatriz"]);
        let flow = flow.expect("in flow");
        assert_eq!(flow.items()[1].engraved_name, "Beatriz");
        assert_eq!(flow.items()[0].engraved_name, "Alex");
    }

    #[test]
    fn correction_index_out_of_range() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["1", "iPhone 13, Alex", "não", "capinha 4, Ana"]);
        assert_eq!(
            flow.expect("in flow").stage(),
            &NameStage::AwaitingCorrectionTarget
        );
        assert!(reply(&step).contains("Número de capinha inválido"));
    }

    #[test]
    fn correction_with_invalid_name_stays() {
        let harness = Harness::new();
        let (flow, step) = harness.run(&["1", "iPhone 13, Alex", "não", "capinha 1, Al3x"]);
        let flow = flow.expect("in flow");
        assert_eq!(flow.stage(), &NameStage::AwaitingCorrectionTarget);
        assert_eq!(flow.items()[0].engraved_name, "Alex");
        assert!(reply(&step).contains("'Al3x' é inválido"));
    }

    #[test]
    fn corrected_name_is_what_gets_stored() {
        let harness = Harness::new();
        harness.run(&["2", "iPhone 13, Alex", "Moto G, Bia", "não", "capinha 2, Bruna", "sim"]);

        let records = harness.sink.records();
        let names: Vec<_> = records
            .iter()
            .map(|(_, item)| match item {
                Customization::Name(item) => item.engraved_name.as_str(),
                Customization::Photo(_) => panic!("unexpected photo item"),
            })
            .collect();
        assert_eq!(names, ["Alex", "Bruna"]);
    }
}
