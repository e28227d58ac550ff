//! Main menu routing.
//!
//! Outside of a flow, a message is either a menu number, a small-talk
//! keyword, or free text matched against topic keywords. Anything else is
//! out of menu.

use crate::rules::RuleKey;

/// Reply to a thank-you message.
pub const THANKS_REPLY: &str = "De nada! Fico feliz em ajudar. Você gostaria de fazer mais alguma \
coisa ou tem alguma outra dúvida?";

/// What a main-menu message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    NameCustomization,
    PhotoCustomization,
    Lookup,
    Refund,
    Faq,
    Exit,
    ShowMenu,
    Thanks,
    /// Free text about a known topic, answered directly.
    Topic(RuleKey),
    OutOfMenu,
}

const REFUND_KEYWORDS: [&str; 3] = ["reembolso", "devolução", "dinheiro de volta"];

/// Phrases that answer a topic straight from the main menu. Checked in
/// order; the first match wins.
const TOPIC_KEYWORDS: [(RuleKey, &[&str]); 10] = [
    (RuleKey::ShippingDelay, &["prazo de envio", "recebimento do pedido"]),
    (RuleKey::WrongPurchase, &["comprei errado", "preciso alterar"]),
    (RuleKey::Payment, &["formas de pagamento", "pagamento"]),
    (RuleKey::CaseApproval, &["ver minha capinha", "aprovar antes do envio"]),
    (RuleKey::IllustrativeImages, &["imagens do anuncio", "diferentes do meu modelo"]),
    (RuleKey::UnknownModel, &["não sei meu modelo de celular", "nao sei meu modelo"]),
    (RuleKey::FontChange, &["mudar o tipo de letra", "alterar fonte"]),
    (RuleKey::CaseProtection, &["capinha possui proteção", "proteção da capinha"]),
    (RuleKey::YellowingCase, &["capinha amarela", "amarela com o tempo"]),
    (RuleKey::DiscountCoupon, &["cupom de desconto", "promoção"]),
];

/// Routes a normalized main-menu message.
#[must_use]
pub fn route(normalized: &str) -> MenuChoice {
    match normalized {
        "1" => return MenuChoice::NameCustomization,
        "2" => return MenuChoice::PhotoCustomization,
        "3" => return MenuChoice::Lookup,
        "4" => return MenuChoice::Refund,
        "5" => return MenuChoice::Faq,
        "6" | "sair" => return MenuChoice::Exit,
        "menu" | "menu principal" | "oi" | "olá" | "tudo bem" => return MenuChoice::ShowMenu,
        "obrigado" | "obrigada" => return MenuChoice::Thanks,
        _ => {}
    }

    if REFUND_KEYWORDS.iter().any(|k| normalized.contains(k)) {
        return MenuChoice::Refund;
    }

    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map_or(MenuChoice::OutOfMenu, |(key, _)| MenuChoice::Topic(*key))
}
