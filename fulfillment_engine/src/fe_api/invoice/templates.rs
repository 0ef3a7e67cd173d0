use crate::fe_api::errors::InvoiceError;

pub const DEFAULT_LOCALE: &str = "en";

/// The fixed wording of an invoice in one language.
#[derive(Debug)]
pub struct InvoiceTemplate {
    pub locale: &'static str,
    pub title: &'static str,
    pub order: &'static str,
    pub date: &'static str,
    pub billed_to: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub item: &'static str,
    pub amount: &'static str,
    pub total: &'static str,
    pub payment: &'static str,
    pub paid_on: &'static str,
    pub transaction: &'static str,
    pub thanks: &'static str,
    pub date_format: &'static str,
    brackets: &'static [(&'static str, &'static str)],
}

impl InvoiceTemplate {
    /// The localised label for an age bracket. Unknown brackets are shown as given.
    pub fn bracket<'a>(&self, key: &'a str) -> &'a str {
        self.brackets.iter().find(|(k, _)| *k == key).map(|(_, label)| *label).unwrap_or(key)
    }
}

static EN: InvoiceTemplate = InvoiceTemplate {
    locale: "en",
    title: "INVOICE",
    order: "Order",
    date: "Date",
    billed_to: "Billed to",
    email: "Email",
    phone: "Phone",
    item: "Item",
    amount: "Amount",
    total: "Total",
    payment: "Payment",
    paid_on: "Paid on",
    transaction: "Transaction",
    thanks: "Thank you for booking with us!",
    date_format: "%Y-%m-%d",
    brackets: &[
        ("adult", "Adults"),
        ("child", "Children"),
        ("infant", "Infants"),
        ("senior", "Seniors"),
        ("student", "Students"),
    ],
};

static FR: InvoiceTemplate = InvoiceTemplate {
    locale: "fr",
    title: "FACTURE",
    order: "Commande",
    date: "Date",
    billed_to: "Facturé à",
    email: "E-mail",
    phone: "Téléphone",
    item: "Article",
    amount: "Montant",
    total: "Total",
    payment: "Paiement",
    paid_on: "Payé le",
    transaction: "Transaction",
    thanks: "Merci pour votre réservation !",
    date_format: "%d/%m/%Y",
    brackets: &[
        ("adult", "Adultes"),
        ("child", "Enfants"),
        ("infant", "Bébés"),
        ("senior", "Seniors"),
        ("student", "Étudiants"),
    ],
};

static ES: InvoiceTemplate = InvoiceTemplate {
    locale: "es",
    title: "FACTURA",
    order: "Pedido",
    date: "Fecha",
    billed_to: "Facturado a",
    email: "Correo",
    phone: "Teléfono",
    item: "Artículo",
    amount: "Importe",
    total: "Total",
    payment: "Pago",
    paid_on: "Pagado el",
    transaction: "Transacción",
    thanks: "¡Gracias por reservar con nosotros!",
    date_format: "%d/%m/%Y",
    brackets: &[
        ("adult", "Adultos"),
        ("child", "Niños"),
        ("infant", "Bebés"),
        ("senior", "Mayores"),
        ("student", "Estudiantes"),
    ],
};

static DE: InvoiceTemplate = InvoiceTemplate {
    locale: "de",
    title: "RECHNUNG",
    order: "Bestellung",
    date: "Datum",
    billed_to: "Rechnung an",
    email: "E-Mail",
    phone: "Telefon",
    item: "Position",
    amount: "Betrag",
    total: "Gesamt",
    payment: "Zahlung",
    paid_on: "Bezahlt am",
    transaction: "Transaktion",
    thanks: "Vielen Dank für Ihre Buchung!",
    date_format: "%d.%m.%Y",
    brackets: &[
        ("adult", "Erwachsene"),
        ("child", "Kinder"),
        ("infant", "Kleinkinder"),
        ("senior", "Senioren"),
        ("student", "Studenten"),
    ],
};

static TEMPLATES: [&InvoiceTemplate; 4] = [&EN, &FR, &ES, &DE];

fn normalise(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}

/// Strict lookup: the locale must name a template exactly (case and `_`/`-` are ignored).
pub fn for_locale(locale: &str) -> Result<&'static InvoiceTemplate, InvoiceError> {
    let wanted = normalise(locale);
    TEMPLATES
        .iter()
        .copied()
        .find(|t| t.locale == wanted)
        .ok_or_else(|| InvoiceError::UnsupportedLocale(locale.to_string()))
}

/// Lenient lookup: the exact locale, then its language prefix (`fr-CA` → `fr`), then [`DEFAULT_LOCALE`].
pub fn resolve(locale: &str) -> &'static InvoiceTemplate {
    for_locale(locale)
        .or_else(|_| {
            let normalised = normalise(locale);
            let language = normalised.split('-').next().unwrap_or_default();
            for_locale(language)
        })
        .unwrap_or(&EN)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strict_lookup() {
        assert_eq!(for_locale("fr").unwrap().locale, "fr");
        assert_eq!(for_locale("DE").unwrap().locale, "de");
        assert!(matches!(for_locale("fr-CA"), Err(InvoiceError::UnsupportedLocale(l)) if l == "fr-CA"));
        assert!(for_locale("pt").is_err());
    }

    #[test]
    fn fallback_chain() {
        assert_eq!(resolve("fr-CA").locale, "fr");
        assert_eq!(resolve("es_MX").locale, "es");
        assert_eq!(resolve("pt-BR").locale, "en");
        assert_eq!(resolve("").locale, "en");
    }

    #[test]
    fn bracket_labels() {
        assert_eq!(resolve("de").bracket("child"), "Kinder");
        assert_eq!(resolve("en").bracket("pensioner"), "pensioner");
    }
}
