//! Anti-bot challenge page detection.

/// Only the head of the body is inspected; challenge interstitials put their
/// banner in the first few hundred characters.
const SCAN_CHARS: usize = 400;

const CHALLENGE_MARKERS: [&str; 4] = [
    "just a moment",
    "checking your browser",
    "attention required",
    "cloudflare",
];

/// Returns `true` when the start of `body` looks like a bot challenge
/// interstitial rather than the requested page.
///
/// `cloudflare` inside a hostname (`cdnjs.cloudflare.com`) is ignored so that
/// ordinary pages loading assets from that CDN are not misclassified.
pub(crate) fn looks_like_challenge(body: &str) -> bool {
    let head: String = body.chars().take(SCAN_CHARS).collect::<String>().to_lowercase();
    CHALLENGE_MARKERS
        .iter()
        .any(|marker| contains_marker(&head, marker))
}

fn contains_marker(head: &str, marker: &str) -> bool {
    head.match_indices(marker).any(|(idx, _)| {
        if marker != "cloudflare" {
            return true;
        }
        let before = head[..idx].chars().next_back();
        let after = head[idx + marker.len()..].chars().next();
        before != Some('.') && after != Some('.')
    })
}
