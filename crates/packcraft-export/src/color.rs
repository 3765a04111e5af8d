//! Colour-space passes for print output.
//!
//! Conversions are device-naive (no ICC profiles). CMYK separations use
//! full grey-component replacement and then cap total ink coverage.

/// Maximum total area coverage for separated CMYK, in percent.
pub const INK_LIMIT: f64 = 300.0;

/// Separate an sRGB colour into CMYK fractions with total ink capped.
pub fn rgb_to_cmyk(r: u8, g: u8, b: u8) -> [f64; 4] {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let k = 1.0 - r.max(g).max(b);
    if k >= 1.0 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let c = (1.0 - r - k) / (1.0 - k);
    let m = (1.0 - g - k) / (1.0 - k);
    let y = (1.0 - b - k) / (1.0 - k);
    limit_ink([c, m, y, k])
}

/// Scale the chromatic channels down so total coverage stays under [`INK_LIMIT`].
fn limit_ink([c, m, y, k]: [f64; 4]) -> [f64; 4] {
    let limit = INK_LIMIT / 100.0;
    let total = c + m + y + k;
    if total <= limit {
        return [c, m, y, k];
    }
    let chroma = c + m + y;
    let factor = ((limit - k) / chroma).clamp(0.0, 1.0);
    [c * factor, m * factor, y * factor, k]
}

pub fn cmyk_to_rgb([c, m, y, k]: [f64; 4]) -> [u8; 3] {
    let channel = |v: f64| ((1.0 - v) * (1.0 - k) * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(c), channel(m), channel(y)]
}

fn quantize(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Round-trip straight RGBA pixels through the CMYK separation in place.
pub fn soft_proof(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let [r, g, b] = cmyk_to_rgb(rgb_to_cmyk(px[0], px[1], px[2]));
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

/// Flatten straight RGBA over white into 3-byte RGB samples.
pub fn rgba_to_rgb_samples(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        out.extend_from_slice(&over_white(px));
    }
    out
}

/// Flatten straight RGBA over white into 4-byte CMYK samples.
pub fn rgba_to_cmyk_samples(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len());
    for px in rgba.chunks_exact(4) {
        let [r, g, b] = over_white(px);
        out.extend(rgb_to_cmyk(r, g, b).map(quantize));
    }
    out
}

fn over_white(px: &[u8]) -> [u8; 3] {
    let alpha = px[3] as u32;
    let blend = |v: u8| ((v as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
    [blend(px[0]), blend(px[1]), blend(px[2])]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(cmyk: [f64; 4]) -> f64 {
        cmyk.iter().sum::<f64>() * 100.0
    }

    #[test]
    fn test_primaries() {
        assert_eq!(rgb_to_cmyk(255, 255, 255), [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(rgb_to_cmyk(0, 0, 0), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb_to_cmyk(0, 255, 255), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rgb_to_cmyk(255, 0, 255), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ink_limit_never_exceeded() {
        for r in (0..=255).step_by(15) {
            for g in (0..=255).step_by(15) {
                for b in (0..=255).step_by(15) {
                    let cmyk = rgb_to_cmyk(r as u8, g as u8, b as u8);
                    assert!(coverage(cmyk) <= INK_LIMIT + 1e-9, "{r},{g},{b} -> {cmyk:?}");
                }
            }
        }
    }

    #[test]
    fn test_round_trip_of_greys_is_exact() {
        for v in [0u8, 64, 128, 200, 255] {
            assert_eq!(cmyk_to_rgb(rgb_to_cmyk(v, v, v)), [v, v, v]);
        }
    }

    #[test]
    fn test_soft_proof_preserves_alpha() {
        let mut pixels = vec![255, 0, 0, 128, 10, 20, 30, 255];
        soft_proof(&mut pixels);
        assert_eq!(pixels[3], 128);
        assert_eq!(pixels[7], 255);
        assert_eq!(&pixels[0..3], &[255, 0, 0]);
    }

    #[test]
    fn test_samples_flatten_over_white() {
        let rgba = [0, 0, 0, 0, 0, 0, 0, 255];
        assert_eq!(rgba_to_rgb_samples(&rgba), vec![255, 255, 255, 0, 0, 0]);
        assert_eq!(rgba_to_cmyk_samples(&rgba), vec![0, 0, 0, 0, 0, 0, 0, 255]);
    }
}
