//! Recognition of post links and referral codes in user text.

use crate::error::GatewayError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use curator_types::ContentRef;
use regex::Regex;

/// Finds links to posts on the configured frontends.
#[derive(Clone, Debug)]
pub struct LinkParser {
    pattern: Regex,
}

impl LinkParser {
    /// Accept links on any of `domains`, e.g. `golos.io`.
    pub fn new(domains: &[String]) -> Result<Self, GatewayError> {
        if domains.is_empty() {
            return Err(GatewayError::InvalidDomain("no frontend domains".to_string()));
        }
        let alternatives = domains
            .iter()
            .map(|d| regex::escape(d.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(
            r"https?://(?:www\.)?(?:{alternatives})/(?:[\w\-]+/)?@([a-z0-9.\-]+)/([a-z0-9\-]+)"
        ))
        .map_err(|e| GatewayError::InvalidDomain(e.to_string()))?;
        Ok(Self { pattern })
    }

    /// The first post link in `text`.
    pub fn find(&self, text: &str) -> Option<ContentRef> {
        let captures = self.pattern.captures(text)?;
        ContentRef::new(&captures[1], &captures[2]).ok()
    }
}

/// Referral code embedded in the invitation link of `account`.
pub fn encode_referral(account: &str) -> String {
    URL_SAFE.encode(account.as_bytes())
}

/// The referrer account carried by a start argument, if it decodes.
pub fn decode_referral(code: &str) -> Option<String> {
    let bytes = URL_SAFE.decode(code.trim()).ok()?;
    let account = String::from_utf8(bytes).ok()?;
    (!account.is_empty()).then_some(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LinkParser {
        LinkParser::new(&["golos.io".to_string(), "golos.blog".to_string()]).unwrap()
    }

    #[test]
    fn finds_links_on_known_frontends() {
        let parser = parser();
        let content = parser
            .find("look at https://golos.io/ru--golos/@alice/my-first-post please")
            .unwrap();
        assert_eq!(content, ContentRef::new("alice", "my-first-post").unwrap());

        let content = parser.find("https://www.golos.blog/@bob.test/p1").unwrap();
        assert_eq!(content, ContentRef::new("bob.test", "p1").unwrap());
    }

    #[test]
    fn ignores_other_domains_and_plain_text() {
        let parser = parser();
        assert!(parser.find("https://example.com/@alice/post").is_none());
        assert!(parser.find("golos.io alice post").is_none());
        assert!(parser.find("https://golosXio/@alice/post").is_none());
    }

    #[test]
    fn empty_domain_list_is_rejected() {
        assert!(LinkParser::new(&[]).is_err());
    }

    #[test]
    fn referral_codes_decode_back_to_accounts() {
        let code = encode_referral("alice");
        assert_eq!(code, "YWxpY2U=");
        assert_eq!(decode_referral(&code).as_deref(), Some("alice"));
        assert_eq!(decode_referral("!!not base64"), None);
        assert_eq!(decode_referral(""), None);
    }
}
