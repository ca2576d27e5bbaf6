use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `STAFFDESK_QUIET=1` drops decorative console output (banners, hints).
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("STAFFDESK_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
