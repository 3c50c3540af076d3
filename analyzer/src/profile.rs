//! Best-effort extraction of profile fields from a fetched profile page.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::{Error, ProfileFields, Result};

static DISPLAY_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span[^>]*class="[^"]*p-name[^"]*"[^>]*>(.*?)</span>"#).unwrap()
});
static BIO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div[^>]*class="[^"]*p-note[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});
static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<span[^>]*class="[^"]*p-label[^"]*"[^>]*>(.*?)</span>"#).unwrap()
});
static FOLLOWERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?si)<span[^>]*class="[^"]*text-bold[^"]*"[^>]*>([^<]*)</span>\s*followers"#)
        .unwrap()
});
static FOLLOWING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?si)<span[^>]*class="[^"]*text-bold[^"]*"[^>]*>([^<]*)</span>\s*following"#)
        .unwrap()
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Extracts [`ProfileFields`] from a profile page document.
///
/// Extraction never fails for individual missing fields; those stay `None`. Only a document with
/// no recognizable markup at all is rejected, as [`Error::ProfileParse`].
pub fn parse_profile(username: &str, document: &str) -> Result<ProfileFields> {
    if !document.contains('<') {
        return Err(Error::ProfileParse {
            username: username.to_string(),
            reason: "document contains no markup".to_string(),
        });
    }

    Ok(ProfileFields {
        display_name: capture(&DISPLAY_NAME, document),
        bio: capture(&BIO, document),
        location: capture(&LOCATION, document),
        followers: capture(&FOLLOWERS, document),
        following: capture(&FOLLOWING, document),
    })
}

fn capture(pattern: &Regex, document: &str) -> Option<String> {
    pattern
        .captures(document)
        .and_then(|captures| captures.get(1))
        .map(|matched| TAG.replace_all(matched.as_str(), "").trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
        <html><body>
          <span class="p-name vcard-fullname" itemprop="name">Linus T</span>
          <div class="p-note user-profile-bio"><div>Kernels and <em>scuba</em> gear</div></div>
          <span class="p-label">Portland, OR</span>
          <a class="Link--secondary" href="?tab=followers">
            <span class="text-bold color-fg-default">1.2k</span> followers
          </a>
          <a class="Link--secondary" href="?tab=following">
            <span class="text-bold color-fg-default">7</span> following
          </a>
        </body></html>
    "#;

    #[test]
    fn extracts_all_known_fields() {
        let fields = parse_profile("linus", PROFILE).unwrap();
        assert_eq!(fields.display_name.as_deref(), Some("Linus T"));
        assert_eq!(fields.bio.as_deref(), Some("Kernels and scuba gear"));
        assert_eq!(fields.location.as_deref(), Some("Portland, OR"));
        assert_eq!(fields.followers.as_deref(), Some("1.2k"));
        assert_eq!(fields.following.as_deref(), Some("7"));
    }

    #[test]
    fn missing_fields_stay_unset() {
        let fields = parse_profile("ghost", "<html><body><p>nothing here</p></body></html>").unwrap();
        assert_eq!(fields, ProfileFields::default());
    }

    #[test]
    fn empty_name_span_counts_as_absent() {
        let document = r#"<span class="p-name"> </span>"#;
        let fields = parse_profile("blank", document).unwrap();
        assert_eq!(fields.display_name, None);
    }

    #[test]
    fn markup_free_document_is_rejected() {
        let err = parse_profile("linus", "rate limited, come back later").unwrap_err();
        assert!(matches!(err, Error::ProfileParse { ref username, .. } if username == "linus"));
    }
}
