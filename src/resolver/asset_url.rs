//! Asset URL classification and canonicalization.
//!
//! Upstream hands out audio locations in three shapes. They are classified
//! once into a [`UrlShape`] and resolved by [`canonicalize_asset_url`]; no
//! other code inspects URL prefixes.

use url::Url;

use super::ResolveError;

/// Production host serving per-verse audio.
pub const DEFAULT_AUDIO_HOST: &str = "https://verses.quran.foundation";

/// Shape of a raw asset URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// Has its own scheme, e.g. `https://host/a.mp3`.
    Absolute,
    /// Starts with `//host/...`.
    ProtocolRelative,
    /// A path on the audio host, e.g. `Alafasy/mp3/001001.mp3`.
    HostRelative,
}

/// Classifies `raw` without resolving it.
#[must_use]
pub fn classify_url(raw: &str) -> UrlShape {
    let trimmed = raw.trim();
    if trimmed.starts_with("//") {
        UrlShape::ProtocolRelative
    } else if Url::parse(trimmed).is_ok_and(|url| url.has_host()) {
        UrlShape::Absolute
    } else {
        UrlShape::HostRelative
    }
}

/// Resolves any [`UrlShape`] into one absolute URL.
///
/// - absolute: kept as is
/// - protocol-relative: `https:` prefixed
/// - host-relative: appended to `audio_host` (leading slashes ignored)
///
/// # Errors
///
/// Returns [`ResolveError::InvalidAssetUrl`] for empty input or when the
/// result does not parse as an http(s) URL.
pub fn canonicalize_asset_url(raw: &str, audio_host: &Url) -> Result<Url, ResolveError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::invalid_asset_url(raw));
    }

    let resolved = match classify_url(trimmed) {
        UrlShape::Absolute => Url::parse(trimmed),
        UrlShape::ProtocolRelative => Url::parse(&format!("https:{trimmed}")),
        UrlShape::HostRelative => {
            let host = audio_host.as_str().trim_end_matches('/');
            Url::parse(&format!("{host}/{}", trimmed.trim_start_matches('/')))
        }
    }
    .map_err(|_| ResolveError::invalid_asset_url(raw))?;

    if !matches!(resolved.scheme(), "http" | "https") {
        return Err(ResolveError::invalid_asset_url(raw));
    }
    Ok(resolved)
}
