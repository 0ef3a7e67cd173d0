mod badge_code;
mod qr;

pub use badge_code::{generate_badge_code, is_valid_badge_code, to_base36, BADGE_CODE_PREFIX};
pub use qr::QrCodeRenderer;
