use qrcode::{render::svg, EcLevel, QrCode};

use crate::traits::{CodeRenderError, CodeRenderer, RenderedCode};

/// Renders badge payloads as SVG QR codes.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeRenderer {
    min_size: u32,
}

impl Default for QrCodeRenderer {
    fn default() -> Self {
        Self { min_size: 200 }
    }
}

impl QrCodeRenderer {
    pub fn new(min_size: u32) -> Self {
        Self { min_size }
    }
}

impl CodeRenderer for QrCodeRenderer {
    fn render(&self, content: &str) -> Result<RenderedCode, CodeRenderError> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::M)
            .map_err(|e| CodeRenderError(e.to_string()))?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(self.min_size, self.min_size)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        Ok(RenderedCode { content_type: "image/svg+xml".into(), bytes: image.into_bytes() })
    }
}
