/// Target language and country for generated copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub language: &'static str,
    pub country: &'static str,
}

pub const DEFAULT_LOCALE: Locale = Locale {
    language: "en",
    country: "US",
};

/// Order matters for language lookups: the first entry for a language wins
const TLD_LOCALES: &[(&str, Locale)] = &[
    (".fr", Locale { language: "fr", country: "FR" }),
    (".de", Locale { language: "de", country: "DE" }),
    (".es", Locale { language: "es", country: "ES" }),
    (".it", Locale { language: "it", country: "IT" }),
    (".co.uk", Locale { language: "en", country: "GB" }),
    (".com.au", Locale { language: "en", country: "AU" }),
    (".ca", Locale { language: "en", country: "CA" }),
    (".jp", Locale { language: "ja", country: "JP" }),
    (".cn", Locale { language: "zh", country: "CN" }),
    (".nl", Locale { language: "nl", country: "NL" }),
    (".br", Locale { language: "pt", country: "BR" }),
    (".ru", Locale { language: "ru", country: "RU" }),
    (".in", Locale { language: "en", country: "IN" }),
];

/// Locale implied by a host name's TLD.
///
/// Multi-part TLDs are tried first and only match when the remaining host
/// still contains a dot, so `example.uk` never matches `.co.uk`.
pub fn locale_for_host(host: &str) -> Option<Locale> {
    let host = host.to_ascii_lowercase();

    let suffix_match = TLD_LOCALES
        .iter()
        .filter(|(tld, _)| tld.matches('.').count() > 1)
        .chain(TLD_LOCALES.iter())
        .find(|(tld, _)| {
            host.strip_suffix(tld)
                .is_some_and(|rest| !rest.is_empty() && rest.contains('.'))
        });
    if let Some((_, locale)) = suffix_match {
        return Some(*locale);
    }

    let last = host.rsplit_once('.')?.1;
    TLD_LOCALES
        .iter()
        .find(|(tld, _)| tld.strip_prefix('.') == Some(last))
        .map(|(_, locale)| *locale)
}

/// Locale for a page or image URL; data URLs and unparseable URLs get the default
pub fn locale_for_url(raw: &str) -> Locale {
    if raw.starts_with("data:") {
        return DEFAULT_LOCALE;
    }
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().and_then(locale_for_host))
        .unwrap_or(DEFAULT_LOCALE)
}

/// Country for an explicitly requested language, US when unknown
pub fn country_for_language(language: &str) -> &'static str {
    TLD_LOCALES
        .iter()
        .find(|(_, locale)| locale.language == language)
        .map(|(_, locale)| locale.country)
        .unwrap_or(DEFAULT_LOCALE.country)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_single_and_multi_part_tlds() {
        assert_eq!(locale_for_url("https://www.example.co.uk/a.png").country, "GB");
        assert_eq!(locale_for_url("https://shop.example.com.au/").country, "AU");
        assert_eq!(locale_for_url("https://example.fr/img.jpg"), Locale { language: "fr", country: "FR" });
        assert_eq!(locale_for_url("https://example.jp").language, "ja");
    }

    #[test]
    fn multi_part_tld_needs_a_domain_in_front() {
        // `example.co.uk` leaves no dot before `.co.uk`, and `.uk` alone is unknown
        assert_eq!(locale_for_url("https://example.co.uk"), DEFAULT_LOCALE);
    }

    #[test]
    fn unknown_hosts_and_data_urls_default() {
        assert_eq!(locale_for_url("https://example.com/x.png"), DEFAULT_LOCALE);
        assert_eq!(locale_for_url("data:image/png;base64,AAAA"), DEFAULT_LOCALE);
        assert_eq!(locale_for_url("not a url"), DEFAULT_LOCALE);
        assert_eq!(locale_for_host("localhost"), None);
    }

    #[test]
    fn requested_language_maps_to_first_matching_country() {
        assert_eq!(country_for_language("fr"), "FR");
        assert_eq!(country_for_language("en"), "GB");
        assert_eq!(country_for_language("sv"), "US");
    }
}
